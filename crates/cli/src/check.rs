//! `stockcheck check`: one reconciliation session from the command line.
//!
//! Each non-blank input line is a scanned IMEI. `:status` prints the live
//! counters, `:done` (or end of input) finalizes.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use stockcheck_config::{History, Settings};
use stockcheck_recon::notify::NotificationSink;
use stockcheck_recon::summary::format_cents;
use stockcheck_recon::{FinalizeReport, LiveCounters, ReconSession, SessionOutcome, Status};

use crate::console::ConsoleSink;
use crate::exit_codes::*;
use crate::source::Source;
use crate::CliError;

pub struct CheckArgs {
    pub scope: Option<String>,
    pub snapshot: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub missing_csv: Option<PathBuf>,
    pub mark_missing_lost: bool,
    pub note: Option<String>,
    pub keep: bool,
    pub verbose: bool,
}

/// Report as exported: the finalize report plus the scope it covers.
#[derive(Serialize)]
struct CheckOutput<'a> {
    scope: &'a str,
    authoritative: bool,
    #[serde(flatten)]
    report: &'a FinalizeReport,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanTally {
    pub accepted: usize,
    pub rejected: usize,
}

pub fn cmd_check(args: CheckArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    let scope = settings.scope_or_default(args.scope.as_deref()).to_string();
    let source = Source::open(args.snapshot.as_deref(), &settings)?;
    let input = open_input(args.input.as_deref())?;

    eprintln!("Stock check: {}", source.describe(&scope));
    let mut session = ReconSession::with_sink(ConsoleSink::stderr(args.verbose));
    session.start_from(&source, &scope).map_err(CliError::recon)?;

    let tally = run_scans(&mut session, input, &mut io::stderr())?;
    log::info!("{} scan(s) accepted, {} rejected", tally.accepted, tally.rejected);

    let report = session.finalize().map_err(CliError::recon)?.clone();
    let output = CheckOutput {
        scope: &scope,
        authoritative: report.baseline.authoritative,
        report: &report,
    };

    if settings.keep_history || args.keep {
        if let Some(history) = History::open_default() {
            if let Err(e) = history.record(&scope, &report) {
                log::warn!("report not kept in history: {}", e);
            }
        }
    }
    if let Some(path) = &args.output {
        write_report(&settings.export_path(path), &output)?;
    }
    if let Some(path) = &args.missing_csv {
        write_missing_csv(&settings.export_path(path), &report)?;
    }

    if args.json {
        let json = serde_json::to_string_pretty(&output).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", json);
    } else {
        print_report(&mut io::stdout().lock(), &report).map_err(|e| CliError::io(e.to_string()))?;
    }

    if args.mark_missing_lost && !report.missing.is_empty() {
        let note = args.note.clone().unwrap_or_else(|| {
            format!("stock check {} {}", scope, report.finalized_at.format("%Y-%m-%d"))
        });
        mark_missing_lost(&mut session, &source, &note)?;
    }

    if !report.baseline.authoritative {
        return Err(CliError {
            code: report_exit_code(&report),
            message: format!("Inventory for '{}' was unavailable; the check is unverified", scope),
            hint: Some("check the connection and token, then run the check again".into()),
        });
    }
    match report_exit_code(&report) {
        EXIT_SUCCESS => Ok(()),
        code => Err(CliError { code, message: String::new(), hint: None }),
    }
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>, CliError> {
    match path {
        None => Ok(Box::new(io::stdin().lock())),
        Some(p) if p.as_os_str() == "-" => Ok(Box::new(io::stdin().lock())),
        Some(p) => {
            let file = File::open(p)
                .map_err(|e| CliError::args(format!("Cannot open scan input {}: {}", p.display(), e)))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

/// Feed input lines into an active session until `:done` or EOF.
pub fn run_scans<N: NotificationSink>(
    session: &mut ReconSession<N>,
    input: impl BufRead,
    status_out: &mut impl Write,
) -> Result<ScanTally, CliError> {
    let mut tally = ScanTally::default();

    for line in input.lines() {
        let line = line.map_err(|e| CliError::io(format!("Failed to read scan input: {}", e)))?;
        match line.trim() {
            ":done" => break,
            ":status" => {
                if let Some(counters) = session.live_counters() {
                    print_counters(status_out, &counters).map_err(|e| CliError::io(e.to_string()))?;
                }
            }
            raw => match session.scan(raw) {
                Ok(Some(_)) => tally.accepted += 1,
                Ok(None) => {}
                Err(e) if e.is_scan_rejection() => tally.rejected += 1,
                Err(e) => return Err(CliError::recon(e)),
            },
        }
    }

    Ok(tally)
}

fn mark_missing_lost<N: NotificationSink>(
    session: &mut ReconSession<N>,
    source: &Source,
    note: &str,
) -> Result<(), CliError> {
    let ids: Vec<String> = session.missing_records().iter().map(|r| r.id.clone()).collect();
    let mut failed = 0;
    for id in &ids {
        if let Err(e) = session.mark_lost(source, id, note) {
            log::debug!("mark lost {}: {}", id, e);
            failed += 1;
        }
    }
    source.persist()?;

    if failed > 0 {
        return Err(CliError {
            code: EXIT_API_WRITE_FAILED,
            message: format!("{} of {} status update(s) failed", failed, ids.len()),
            hint: Some("retry with `stockcheck mark-lost <ID>`".into()),
        });
    }
    eprintln!("Marked {} device(s) as lost", ids.len());
    Ok(())
}

// ── Output ──────────────────────────────────────────────────────────

fn write_report(path: &Path, output: &CheckOutput<'_>) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CliError::io(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(output).map_err(|e| CliError::io(e.to_string()))?;
    fs::write(path, json).map_err(|e| CliError::io(format!("Failed to write {}: {}", path.display(), e)))?;
    eprintln!("Report written to {}", path.display());
    Ok(())
}

fn write_missing_csv(path: &Path, report: &FinalizeReport) -> Result<(), CliError> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| CliError::io(format!("Failed to create {}: {}", path.display(), e)))?;
    wtr.write_record(["id", "imei", "model", "storage", "color", "quality", "status", "cost"])
        .map_err(|e| CliError::io(e.to_string()))?;
    for rec in &report.missing {
        wtr.write_record([
            rec.id.as_str(),
            rec.imei.as_str(),
            rec.model.as_str(),
            rec.storage.as_str(),
            rec.color.as_str(),
            rec.quality.as_str(),
            rec.status.as_str(),
            format_cents(rec.cost_cents).as_str(),
        ])
        .map_err(|e| CliError::io(e.to_string()))?;
    }
    wtr.flush().map_err(|e| CliError::io(e.to_string()))?;
    eprintln!("Missing list written to {}", path.display());
    Ok(())
}

fn print_counters(out: &mut impl Write, counters: &LiveCounters) -> io::Result<()> {
    writeln!(out, "  scanned {} of {}, {} left", counters.scanned, counters.expected_total, counters.pending_display())?;
    for status in Status::SCANNABLE {
        writeln!(out, "    {:<16} {}", status, counters.remaining_for(status))?;
    }
    Ok(())
}

fn print_report(out: &mut impl Write, report: &FinalizeReport) -> io::Result<()> {
    let outcome = match report.outcome {
        SessionOutcome::Complete => "complete",
        SessionOutcome::Discrepancy => "discrepancy",
        SessionOutcome::Incomplete => "incomplete",
    };
    writeln!(out, "Result: {}", outcome)?;
    if !report.baseline.authoritative {
        writeln!(out, "  (inventory was unavailable; counts are not authoritative)")?;
    }
    writeln!(out, "  expected  {}", report.expected_total)?;
    writeln!(out, "  found     {}", report.scanned)?;
    writeln!(out, "  unknown   {}", report.unknown_scans)?;
    writeln!(out)?;
    writeln!(out, "  {:<16} {:>8}", "status", "expected")?;
    for (status, count) in &report.baseline.counts {
        writeln!(out, "  {:<16} {:>8}", status, count)?;
    }

    if !report.missing.is_empty() {
        writeln!(out)?;
        writeln!(out, "Missing ({}):", report.missing.len())?;
        for rec in &report.missing {
            writeln!(out, "  {:<8} {:<16} {:<16} {}", rec.id, rec.imei, rec.status, rec.label())?;
        }
    }
    Ok(())
}
