//! Inventory commands outside a check session.
//!
//! `stockcheck login`        store API token
//! `stockcheck summary`      device counts per status
//! `stockcheck list`         filtered record listing
//! `stockcheck mark-lost`    single-record remediation
//! `stockcheck mark-found`   undo a loss
//! `stockcheck history`      retained check reports

use std::io::{self, Write};
use std::path::PathBuf;

use stockcheck_config::{History, Settings};
use stockcheck_inventory_client::{save_auth, AuthCredentials, DEFAULT_API_BASE};
use stockcheck_recon::notify::RemediationAction;
use stockcheck_recon::remediation::{mark_found, mark_lost_record};
use stockcheck_recon::summary::format_cents;
use stockcheck_recon::{RecordFilter, SessionOutcome, Status, StatusSummary};

use crate::console::ConsoleSink;
use crate::exit_codes::*;
use crate::source::Source;
use crate::CliError;

// ── Login ───────────────────────────────────────────────────────────

pub fn cmd_login(token: String, api_base: Option<String>, operator: Option<String>) -> Result<(), CliError> {
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "No token provided".into(),
            hint: Some("pass --token or set STOCKCHECK_TOKEN".into()),
        });
    }

    let settings = Settings::load();
    let api_base = api_base
        .or(settings.api_base)
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
        return Err(CliError::args(format!("Invalid API base '{}'", api_base))
            .with_hint("example: --api-base https://shop.example.com"));
    }

    let mut creds = AuthCredentials::new(token, api_base);
    creds.operator = operator;
    let path = save_auth(&creds).map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;

    eprintln!("Saved credentials for {} to {}", creds.api_base, path.display());
    Ok(())
}

// ── Summary ─────────────────────────────────────────────────────────

pub fn cmd_summary(scope: Option<String>, snapshot: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let settings = Settings::load();
    let scope = settings.scope_or_default(scope.as_deref()).to_string();
    let source = Source::open(snapshot.as_deref(), &settings)?;
    let summary = StatusSummary::from_records(&source.records(&scope)?);

    if json {
        let out = serde_json::to_string_pretty(&summary).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_summary(&mut out, &source.describe(&scope), &summary).map_err(|e| CliError::io(e.to_string()))
}

fn print_summary(out: &mut impl Write, title: &str, summary: &StatusSummary) -> io::Result<()> {
    writeln!(out, "Inventory: {}", title)?;
    writeln!(out, "  {:<16} {:>6} {:>12}", "status", "count", "cost")?;
    for (status, totals) in &summary.by_status {
        writeln!(out, "  {:<16} {:>6} {:>12}", status, totals.count, format_cents(totals.cost_cents))?;
    }
    writeln!(out, "  {:<16} {:>6} {:>12}", "total", summary.total_records, format_cents(summary.total_cost_cents))?;
    writeln!(out, "  on shelf: {}", summary.scannable)
}

// ── List ────────────────────────────────────────────────────────────

pub fn cmd_list(
    statuses: Vec<String>,
    search: Option<String>,
    scope: Option<String>,
    snapshot: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let statuses = statuses
        .iter()
        .flat_map(|s| s.split(','))
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Status>().map_err(|e| {
            CliError::args(e.to_string())
                .with_hint(format!("one of: {}", Status::ALL.map(Status::as_str).join(", ")))
        }))
        .collect::<Result<Vec<_>, _>>()?;

    let settings = Settings::load();
    let scope = settings.scope_or_default(scope.as_deref()).to_string();
    let source = Source::open(snapshot.as_deref(), &settings)?;
    let records = source.records(&scope)?;
    let filter = RecordFilter { statuses, query: search };
    let hits = filter.apply(&records);

    if json {
        let out = serde_json::to_string_pretty(&hits).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for rec in &hits {
        writeln!(out, "{:<8} {:<16} {:<16} {}", rec.id, rec.imei, rec.status, rec.label())
            .map_err(|e| CliError::io(e.to_string()))?;
    }
    eprintln!("{} of {} record(s)", hits.len(), records.len());
    Ok(())
}

// ── Remediation ─────────────────────────────────────────────────────

pub fn cmd_mark(
    action: RemediationAction,
    record_id: String,
    note: Option<String>,
    snapshot: Option<PathBuf>,
) -> Result<(), CliError> {
    let settings = Settings::load();
    let source = Source::open(snapshot.as_deref(), &settings)?;
    let note = note.unwrap_or_else(|| format!("{} via stockcheck", action));
    let mut sink = ConsoleSink::stderr(true);

    let result = match action {
        RemediationAction::MarkLost => mark_lost_record(&source, &mut sink, &record_id, &note),
        RemediationAction::MarkFound => mark_found(&source, &mut sink, &record_id, &note),
    };
    result.map_err(CliError::recon)?;
    source.persist()
}

// ── History ─────────────────────────────────────────────────────────

pub fn cmd_history(json: bool) -> Result<(), CliError> {
    let history = History::open_default().ok_or_else(|| CliError {
        code: EXIT_ERROR,
        message: "Could not determine config directory".into(),
        hint: Some("set STOCKCHECK_CONFIG_DIR".into()),
    })?;
    let entries = history.list();

    if json {
        let out = serde_json::to_string_pretty(&entries).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No stock checks recorded in {}", history.dir().display());
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for e in &entries {
        let outcome = match e.outcome {
            SessionOutcome::Complete => "complete",
            SessionOutcome::Discrepancy => "discrepancy",
            SessionOutcome::Incomplete => "incomplete",
        };
        writeln!(
            out,
            "{}  {:<12} {:<12} found {}/{}  missing {}",
            e.finalized_at.format("%Y-%m-%d %H:%M"),
            e.scope,
            outcome,
            e.scanned,
            e.expected_total,
            e.missing,
        )
        .map_err(|err| CliError::io(err.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcheck_recon::InventoryRecord;

    #[test]
    fn summary_table() {
        let mut a = InventoryRecord::new("1", "111", Status::Available);
        a.cost_cents = 12345;
        let records = vec![a, InventoryRecord::new("2", "222", Status::Sold)];
        let summary = StatusSummary::from_records(&records);

        let mut out = Vec::new();
        print_summary(&mut out, "snap.json", &summary).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Inventory: snap.json"));
        assert!(text.contains("available             1       123.45"), "{text}");
        assert!(text.contains("on shelf: 1"));
    }
}
