use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{InventoryRecord, Status};

/// Expected counts frozen at session start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionBaseline {
    /// One entry per scannable status, zero included.
    pub counts: BTreeMap<Status, usize>,
    pub expected_total: usize,
    /// `blake3:<hex>` over the snapshot's (id, imei, status) triples.
    pub fingerprint: String,
    /// False when the snapshot could not be fetched and the baseline is empty.
    pub authoritative: bool,
    pub taken_at: DateTime<Utc>,
}

impl SessionBaseline {
    pub fn from_records(records: &[InventoryRecord]) -> Self {
        let mut counts: BTreeMap<Status, usize> =
            Status::SCANNABLE.iter().map(|s| (*s, 0)).collect();

        for rec in records.iter().filter(|r| r.status.is_scannable()) {
            *counts.entry(rec.status).or_insert(0) += 1;
        }

        let expected_total = counts.values().sum();

        Self {
            counts,
            expected_total,
            fingerprint: snapshot_fingerprint(records),
            authoritative: true,
            taken_at: Utc::now(),
        }
    }

    /// Zero baseline used when the snapshot fetch failed.
    pub fn unavailable() -> Self {
        Self {
            authoritative: false,
            ..Self::from_records(&[])
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// Order-independent content hash of a snapshot.
///
/// Only id, IMEI and status participate: descriptive fields may be edited
/// without invalidating a running count.
pub fn snapshot_fingerprint(records: &[InventoryRecord]) -> String {
    let mut keyed: Vec<(&str, &str, Status)> = records
        .iter()
        .map(|r| (r.id.as_str(), r.imei.trim(), r.status))
        .collect();
    keyed.sort();

    let mut hasher = blake3::Hasher::new();
    for (id, imei, status) in keyed {
        hasher.update(id.as_bytes());
        hasher.update(b"\t");
        hasher.update(imei.as_bytes());
        hasher.update(b"\t");
        hasher.update(status.as_str().as_bytes());
        hasher.update(b"\n");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}
