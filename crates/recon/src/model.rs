use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::baseline::SessionBaseline;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a device in the inventory store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Available,
    Reserved,
    Sold,
    InternalRepair,
    ExternalRepair,
    ToRepair,
    Lost,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Available,
        Status::Reserved,
        Status::Sold,
        Status::InternalRepair,
        Status::ExternalRepair,
        Status::ToRepair,
        Status::Lost,
    ];

    /// Statuses that must be physically present on the shelf.
    pub const SCANNABLE: [Status; 3] = [Status::Available, Status::Reserved, Status::InternalRepair];

    pub fn is_scannable(self) -> bool {
        matches!(self, Status::Available | Status::Reserved | Status::InternalRepair)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Available => "available",
            Status::Reserved => "reserved",
            Status::Sold => "sold",
            Status::InternalRepair => "internal_repair",
            Status::ExternalRepair => "external_repair",
            Status::ToRepair => "to_repair",
            Status::Lost => "lost",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a status string is not one of the known wire names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown status: \"{}\"", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(|c: char| c == '-' || c == ' ', "_");
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == normalized)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Inventory records
// ---------------------------------------------------------------------------

/// One device as held by the inventory store. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: String,
    pub imei: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub quality: String,
    /// Battery health, percent.
    #[serde(default)]
    pub battery: Option<u8>,
    pub status: Status,
    /// Purchase cost in minor units (cents).
    #[serde(default)]
    pub cost_cents: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    /// Minimal record, used by loaders and tests.
    pub fn new(id: impl Into<String>, imei: impl Into<String>, status: Status) -> Self {
        Self {
            id: id.into(),
            imei: imei.into(),
            model: String::new(),
            color: String::new(),
            storage: String::new(),
            quality: String::new(),
            battery: None,
            status,
            cost_cents: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// One-line label for operator output, e.g. "iPhone 13 128GB Blue".
    pub fn label(&self) -> String {
        [self.model.as_str(), self.storage.as_str(), self.color.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// Scan log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Bound to the snapshot record with this id and (frozen) status.
    Found { record_id: String, status: Status },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanEvent {
    pub imei: String,
    pub scanned_at: DateTime<Utc>,
    pub outcome: ScanOutcome,
}

impl ScanEvent {
    pub fn found_status(&self) -> Option<Status> {
        match self.outcome {
            ScanOutcome::Found { status, .. } => Some(status),
            ScanOutcome::NotFound => None,
        }
    }
}

/// Returned for an accepted scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReceipt {
    pub imei: String,
    pub record_id: String,
    pub status: Status,
    /// `live_remaining` for the record's status after this scan.
    pub remaining_for_status: i64,
    pub pending_to_scan: i64,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Active,
    Finalized,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every expected device was scanned and identities match.
    Complete,
    /// At least one scannable record was never scanned.
    Discrepancy,
    /// Fewer scans than expected with no identity mismatch. Needs investigation.
    Incomplete,
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Discrepancy => write!(f, "discrepancy"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

// ---------------------------------------------------------------------------
// Counters + report
// ---------------------------------------------------------------------------

/// Counters derived from the baseline and scan log of an active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveCounters {
    pub expected_total: usize,
    pub scanned: usize,
    /// Not clamped; goes negative if the log outgrows the baseline.
    pub pending_to_scan: i64,
    pub remaining: BTreeMap<Status, i64>,
}

impl LiveCounters {
    pub fn remaining_for(&self, status: Status) -> i64 {
        self.remaining.get(&status).copied().unwrap_or(0)
    }

    /// `pending_to_scan` floored at zero, for display.
    pub fn pending_display(&self) -> usize {
        self.pending_to_scan.max(0) as usize
    }
}

/// Frozen result of a finalized session.
///
/// `missing` is the live remediation view: records are removed from it as
/// they are marked lost. `outcome` always reflects the moment of finalize.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeReport {
    pub outcome: SessionOutcome,
    pub expected_total: usize,
    pub scanned: usize,
    pub unknown_scans: usize,
    pub baseline: SessionBaseline,
    pub missing: Vec<InventoryRecord>,
    pub scan_log: Vec<ScanEvent>,
    pub started_at: DateTime<Utc>,
    pub finalized_at: DateTime<Utc>,
    pub engine_version: String,
}

impl FinalizeReport {
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }
}
