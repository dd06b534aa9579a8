//! Operator-facing notifications.
//!
//! The variants are the contract: every situation an operator must be able
//! to tell apart has its own variant. `Display` wording is informational.

use std::fmt;

use crate::model::{SessionOutcome, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownImei,
    NonScannableStatus(Status),
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationAction {
    MarkLost,
    MarkFound,
}

impl RemediationAction {
    pub fn target_status(self) -> Status {
        match self {
            Self::MarkLost => Status::Lost,
            Self::MarkFound => Status::Available,
        }
    }
}

impl fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkLost => write!(f, "mark lost"),
            Self::MarkFound => write!(f, "mark found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SessionStarted { expected_total: usize, authoritative: bool },
    SnapshotUnavailable { message: String },
    ScanAccepted { imei: String, status: Status, pending_to_scan: i64 },
    ScanRejected { imei: String, reason: RejectReason },
    SessionFinalized { outcome: SessionOutcome, missing: usize },
    RemediationSucceeded { record_id: String, action: RemediationAction },
    RemediationFailed { record_id: String, action: RemediationAction, message: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionStarted { expected_total, authoritative: true } => {
                write!(f, "session started: {expected_total} device(s) to verify")
            }
            Self::SessionStarted { expected_total, authoritative: false } => {
                write!(f, "session started without inventory data ({expected_total} expected)")
            }
            Self::SnapshotUnavailable { message } => {
                write!(f, "inventory unavailable, counts are not authoritative: {message}")
            }
            Self::ScanAccepted { imei, status, pending_to_scan } => {
                write!(f, "ok {imei} ({status}), {} left", (*pending_to_scan).max(0))
            }
            Self::ScanRejected { imei, reason: RejectReason::UnknownImei } => {
                write!(f, "rejected {imei}: not in inventory")
            }
            Self::ScanRejected { imei, reason: RejectReason::NonScannableStatus(status) } => {
                write!(f, "rejected {imei}: {status}, not required for verification")
            }
            Self::ScanRejected { imei, reason: RejectReason::Duplicate } => {
                write!(f, "rejected {imei}: already scanned")
            }
            Self::SessionFinalized { outcome: SessionOutcome::Complete, .. } => {
                write!(f, "stock check complete, no discrepancies")
            }
            Self::SessionFinalized { outcome: SessionOutcome::Discrepancy, missing } => {
                write!(f, "stock check finished with {missing} missing device(s)")
            }
            Self::SessionFinalized { outcome: SessionOutcome::Incomplete, .. } => {
                write!(f, "stock check incomplete: counts are inconsistent, investigate")
            }
            Self::RemediationSucceeded { record_id, action } => {
                write!(f, "{action}: record {record_id} updated")
            }
            Self::RemediationFailed { record_id, action, message } => {
                write!(f, "{action}: record {record_id} not updated: {message}")
            }
        }
    }
}

/// Receives notifications as the session produces them.
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

impl<F: FnMut(Notification)> NotificationSink for F {
    fn notify(&mut self, notification: Notification) {
        self(notification)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _notification: Notification) {}
}

/// Keeps every notification in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<Notification>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&Notification> {
        self.events.last()
    }

    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.events)
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, notification: Notification) {
        self.events.push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reasons_render_distinctly() {
        let unknown = Notification::ScanRejected { imei: "1".into(), reason: RejectReason::UnknownImei };
        let sold = Notification::ScanRejected {
            imei: "1".into(),
            reason: RejectReason::NonScannableStatus(Status::Sold),
        };
        let dup = Notification::ScanRejected { imei: "1".into(), reason: RejectReason::Duplicate };
        let texts = [unknown.to_string(), sold.to_string(), dup.to_string()];
        assert!(texts[1].contains("sold"));
        assert_ne!(texts[0], texts[1]);
        assert_ne!(texts[1], texts[2]);
        assert_ne!(texts[0], texts[2]);
    }

    #[test]
    fn accepted_floors_pending() {
        let n = Notification::ScanAccepted { imei: "9".into(), status: Status::Available, pending_to_scan: -2 };
        assert_eq!(n.to_string(), "ok 9 (available), 0 left");
    }

    #[test]
    fn closure_is_a_sink() {
        let mut seen = 0;
        {
            let mut sink = |_n: Notification| seen += 1;
            sink.notify(Notification::SnapshotUnavailable { message: "x".into() });
            sink.notify(Notification::SnapshotUnavailable { message: "y".into() });
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn recording_sink_take_drains() {
        let mut sink = RecordingSink::default();
        sink.notify(Notification::SnapshotUnavailable { message: "down".into() });
        assert!(sink.last().is_some());
        assert_eq!(sink.take().len(), 1);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn remediation_targets() {
        assert_eq!(RemediationAction::MarkLost.target_status(), Status::Lost);
        assert_eq!(RemediationAction::MarkFound.target_status(), Status::Available);
    }
}
