use std::fmt;

use crate::model::{SessionPhase, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// Scanned IMEI does not appear in the session snapshot.
    UnknownImei(String),
    /// IMEI belongs to a record whose status is not subject to verification.
    NonScannableStatus { imei: String, status: Status },
    /// IMEI was already accepted earlier in this session.
    DuplicateScan(String),
    /// Inventory snapshot could not be fetched.
    ExternalFetchFailure(String),
    /// Inventory status update was rejected or could not be sent.
    ExternalWriteFailure { record_id: String, message: String },
    /// Operation is not allowed in the current lifecycle phase.
    InvalidTransition { phase: SessionPhase, action: &'static str },
    /// Record id is not part of the session snapshot.
    RecordNotFound(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownImei(imei) => write!(f, "unknown IMEI: {imei}"),
            Self::NonScannableStatus { imei, status } => {
                write!(f, "IMEI {imei} is {status}, not required for verification")
            }
            Self::DuplicateScan(imei) => write!(f, "IMEI {imei} already scanned in this session"),
            Self::ExternalFetchFailure(msg) => write!(f, "inventory fetch failed: {msg}"),
            Self::ExternalWriteFailure { record_id, message } => {
                write!(f, "inventory update for record '{record_id}' failed: {message}")
            }
            Self::InvalidTransition { phase, action } => {
                write!(f, "cannot {action} while session is {phase}")
            }
            Self::RecordNotFound(id) => write!(f, "record '{id}' is not part of this session"),
        }
    }
}

impl std::error::Error for ReconError {}

impl ReconError {
    /// True for the three per-scan rejections. These never end a session.
    pub fn is_scan_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownImei(_) | Self::NonScannableStatus { .. } | Self::DuplicateScan(_)
        )
    }
}
