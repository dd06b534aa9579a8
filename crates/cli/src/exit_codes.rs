//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success (stock check: complete)          |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | check            | Stock check outcome and input codes      |
//! |         |                  | (6: inventory unavailable, unverified)   |
//! | 40-49   | inventory        | Inventory API codes                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use stockcheck_inventory_client::ClientError;
use stockcheck_recon::{FinalizeReport, ReconError, SessionOutcome};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
/// For `check`, every expected device was scanned and nothing is missing.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Check (3-9)
// =============================================================================

/// At least one expected device was not scanned.
pub const EXIT_CHECK_DISCREPANCY: u8 = 3;

/// Nothing is missing but the found count differs from the baseline total.
pub const EXIT_CHECK_INCOMPLETE: u8 = 4;

/// `--snapshot` file is missing, unreadable, or not a record listing.
pub const EXIT_SNAPSHOT_INVALID: u8 = 5;

/// The inventory could not be fetched, so the check has no baseline to
/// verify against. Scans were still logged.
pub const EXIT_CHECK_UNVERIFIED: u8 = 6;

// =============================================================================
// Inventory API (40-49)
// =============================================================================

/// Not authenticated (no saved token).
pub const EXIT_API_NOT_AUTH: u8 = 40;

/// Network failure or unreadable response.
pub const EXIT_API_NETWORK: u8 = 41;

/// Server answered with a non-success status other than 400/422.
pub const EXIT_API_HTTP: u8 = 42;

/// Server rejected the request (400/422).
pub const EXIT_API_VALIDATION: u8 = 43;

/// A status write (mark lost / mark found) failed.
pub const EXIT_API_WRITE_FAILED: u8 = 44;

// =============================================================================
// Mapping
// =============================================================================

/// Exit code for a finalized stock check.
pub fn outcome_exit_code(outcome: SessionOutcome) -> u8 {
    match outcome {
        SessionOutcome::Complete => EXIT_SUCCESS,
        SessionOutcome::Discrepancy => EXIT_CHECK_DISCREPANCY,
        SessionOutcome::Incomplete => EXIT_CHECK_INCOMPLETE,
    }
}

/// Exit code for a finalized report. A non-authoritative baseline always
/// fails, whatever the outcome says.
pub fn report_exit_code(report: &FinalizeReport) -> u8 {
    if !report.baseline.authoritative {
        return EXIT_CHECK_UNVERIFIED;
    }
    outcome_exit_code(report.outcome)
}

/// Map a ClientError to its exit code.
pub fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::NotAuthenticated => EXIT_API_NOT_AUTH,
        ClientError::Network(_) | ClientError::Parse(_) => EXIT_API_NETWORK,
        ClientError::Http(401, _) | ClientError::Http(403, _) => EXIT_API_NOT_AUTH,
        ClientError::Http(_, _) => EXIT_API_HTTP,
        ClientError::Validation(_) => EXIT_API_VALIDATION,
        ClientError::Io(_) => EXIT_ERROR,
    }
}

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ExternalWriteFailure { .. } => EXIT_API_WRITE_FAILED,
        ReconError::ExternalFetchFailure(_) => EXIT_API_NETWORK,
        ReconError::RecordNotFound(_) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_codes_are_distinct() {
        let codes = [
            outcome_exit_code(SessionOutcome::Complete),
            outcome_exit_code(SessionOutcome::Discrepancy),
            outcome_exit_code(SessionOutcome::Incomplete),
        ];
        assert_eq!(codes, [0, 3, 4]);
    }

    #[test]
    fn unavailable_baseline_is_never_success() {
        use stockcheck_recon::{InventoryRecord, MemoryInventory, ReconSession, Status};

        let offline = MemoryInventory::new(vec![InventoryRecord::new("1", "111", Status::Available)]);
        offline.set_fail_reads(true);
        let mut session = ReconSession::new();
        session.start_from(&offline, "main").unwrap();
        let report = session.finalize().unwrap();
        assert_eq!(report.outcome, SessionOutcome::Complete);
        assert_eq!(report_exit_code(report), EXIT_CHECK_UNVERIFIED);

        let mut session = ReconSession::new();
        session.start(vec![InventoryRecord::new("1", "111", Status::Available)]).unwrap();
        session.scan("111").unwrap();
        assert_eq!(report_exit_code(session.finalize().unwrap()), EXIT_SUCCESS);
    }

    #[test]
    fn client_codes() {
        assert_eq!(client_exit_code(&ClientError::NotAuthenticated), EXIT_API_NOT_AUTH);
        assert_eq!(client_exit_code(&ClientError::Http(401, String::new())), EXIT_API_NOT_AUTH);
        assert_eq!(client_exit_code(&ClientError::Http(503, String::new())), EXIT_API_HTTP);
        assert_eq!(client_exit_code(&ClientError::Validation(String::new())), EXIT_API_VALIDATION);
        assert_eq!(client_exit_code(&ClientError::Network(String::new())), EXIT_API_NETWORK);
    }

    #[test]
    fn write_failure_code() {
        let err = ReconError::ExternalWriteFailure { record_id: "1".into(), message: "x".into() };
        assert_eq!(recon_exit_code(&err), EXIT_API_WRITE_FAILED);
    }
}
