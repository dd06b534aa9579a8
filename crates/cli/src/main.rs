// stockcheck CLI - inventory stock checks from the terminal

mod check;
mod commands;
mod console;
mod exit_codes;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stockcheck_inventory_client::ClientError;
use stockcheck_recon::notify::RemediationAction;
use stockcheck_recon::ReconError;

use exit_codes::{client_exit_code, recon_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "stockcheck")]
#[command(about = "Inventory stock checks: scan IMEIs, find missing devices")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save an API token for the inventory service
    #[command(after_help = "\
Examples:
  stockcheck login --token sk_live_123 --api-base https://shop.example.com
  STOCKCHECK_TOKEN=sk_live_123 stockcheck login")]
    Login {
        /// Bearer token
        #[arg(long, env = "STOCKCHECK_TOKEN", hide_env_values = true)]
        token: String,

        /// API base URL (default: inventory.apiBase setting)
        #[arg(long)]
        api_base: Option<String>,

        /// Operator name shown in logs
        #[arg(long)]
        operator: Option<String>,
    },

    /// Device counts and cost per status
    #[command(after_help = "\
Examples:
  stockcheck summary --scope downtown
  stockcheck summary --snapshot inventory.json --json")]
    Summary {
        /// Store/location (default: inventory.defaultScope setting)
        #[arg(long)]
        scope: Option<String>,

        /// Read records from a JSON file instead of the API
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List inventory records
    #[command(after_help = "\
Examples:
  stockcheck list --status available --status reserved
  stockcheck list --status lost,sold --search iphone
  stockcheck list --snapshot inventory.json --search 3569 --json")]
    List {
        /// Keep only these statuses. Repeatable; comma-separated accepted.
        #[arg(long, value_name = "STATUS")]
        status: Vec<String>,

        /// Case-insensitive match on IMEI, model, color or storage
        #[arg(long, value_name = "TEXT")]
        search: Option<String>,

        /// Store/location (default: inventory.defaultScope setting)
        #[arg(long)]
        scope: Option<String>,

        /// Read records from a JSON file instead of the API
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a stock check: read scanned IMEIs, report missing devices
    #[command(after_help = "\
Input is one IMEI per line (a barcode scanner in keyboard mode works).
  :status   print live counters
  :done     finish (same as end of input)

Exit codes: 0 complete, 3 discrepancy, 4 incomplete, 6 inventory unavailable.

Examples:
  stockcheck check --scope downtown
  stockcheck check --snapshot inventory.json --input scans.txt --json
  stockcheck check --input scans.txt --missing-csv missing.csv --mark-missing-lost")]
    Check {
        /// Store/location (default: inventory.defaultScope setting)
        #[arg(long)]
        scope: Option<String>,

        /// Read records from a JSON file instead of the API.
        /// Status changes are written back to the file.
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Scan input file (`-` or omitted for stdin)
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Print the final report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to a file
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write the missing devices as CSV
        #[arg(long, value_name = "FILE")]
        missing_csv: Option<PathBuf>,

        /// Mark every missing device as lost after the check
        #[arg(long)]
        mark_missing_lost: bool,

        /// Note attached to status changes
        #[arg(long, requires = "mark_missing_lost")]
        note: Option<String>,

        /// Keep the report in history even when check.keepHistory is off
        #[arg(long)]
        keep: bool,

        /// Print every accepted scan
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Mark one device as lost
    MarkLost {
        /// Record id
        id: String,

        /// Note attached to the status change
        #[arg(long)]
        note: Option<String>,

        /// Update a JSON snapshot file instead of the API
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,
    },

    /// Return a lost device to available
    MarkFound {
        /// Record id
        id: String,

        /// Note attached to the status change
        #[arg(long)]
        note: Option<String>,

        /// Update a JSON snapshot file instead of the API
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,
    },

    /// Show retained stock check reports, newest first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  stockcheck-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  stockcheck-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("STOCKCHECK_LOG", "warn"))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: stockcheck <command> [options]");
            eprintln!("       stockcheck --help for more information");
            Err(CliError { code: EXIT_USAGE, message: String::new(), hint: None })
        }
        Some(Commands::Login { token, api_base, operator }) => commands::cmd_login(token, api_base, operator),
        Some(Commands::Summary { scope, snapshot, json }) => commands::cmd_summary(scope, snapshot, json),
        Some(Commands::List { status, search, scope, snapshot, json }) => {
            commands::cmd_list(status, search, scope, snapshot, json)
        }
        Some(Commands::Check {
            scope,
            snapshot,
            input,
            json,
            output,
            missing_csv,
            mark_missing_lost,
            note,
            keep,
            verbose,
        }) => check::cmd_check(check::CheckArgs {
            scope,
            snapshot,
            input,
            json,
            output,
            missing_csv,
            mark_missing_lost,
            note,
            keep,
            verbose,
        }),
        Some(Commands::MarkLost { id, note, snapshot }) => {
            commands::cmd_mark(RemediationAction::MarkLost, id, note, snapshot)
        }
        Some(Commands::MarkFound { id, note, snapshot }) => {
            commands::cmd_mark(RemediationAction::MarkFound, id, note, snapshot)
        }
        Some(Commands::History { json }) => commands::cmd_history(json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from an inventory API error with the proper exit code.
    pub fn client(err: ClientError) -> Self {
        let code = client_exit_code(&err);
        let hint = match &err {
            ClientError::NotAuthenticated => Some("run `stockcheck login --token <TOKEN>`".to_string()),
            ClientError::Http(401, _) | ClientError::Http(403, _) => {
                Some("the saved token was rejected; run `stockcheck login` again".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Create error from an engine error with the proper exit code.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::RecordNotFound(_) => Some("check the id with `stockcheck list`".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
