//! Operator-facing output for a running check.
//!
//! Notifications go to stderr so `--json` stdout stays a single value.

use std::io::Write;

use stockcheck_recon::notify::{Notification, NotificationSink};

pub struct ConsoleSink<W: Write> {
    out: W,
    /// Print accepted scans too, not just rejections and lifecycle events.
    pub verbose: bool,
}

impl ConsoleSink<std::io::Stderr> {
    pub fn stderr(verbose: bool) -> Self {
        Self { out: std::io::stderr(), verbose }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NotificationSink for ConsoleSink<W> {
    fn notify(&mut self, n: Notification) {
        let prefix = match &n {
            Notification::ScanAccepted { .. } if !self.verbose => return,
            Notification::ScanAccepted { .. } => "   ",
            Notification::ScanRejected { .. } => " !!",
            Notification::SnapshotUnavailable { .. } | Notification::RemediationFailed { .. } => "warn",
            _ => "",
        };
        // Best effort.
        let _ = if prefix.is_empty() {
            writeln!(self.out, "{}", n)
        } else {
            writeln!(self.out, "{} {}", prefix, n)
        };
    }
}
