//! Stock reconciliation session: `Idle → Active → Finalized → Idle`.
//!
//! The session freezes a snapshot of inventory records at `start`, accepts
//! scanned IMEIs one at a time, and at `finalize` reports which scannable
//! records were never seen. Counters are always derived from the baseline and
//! the scan log; nothing else is cached.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::baseline::{snapshot_fingerprint, SessionBaseline};
use crate::error::ReconError;
use crate::model::{
    FinalizeReport, InventoryRecord, LiveCounters, ScanEvent, ScanOutcome, ScanReceipt,
    SessionOutcome, SessionPhase, Status,
};
use crate::notify::{Notification, NotificationSink, NullSink, RejectReason, RemediationAction};
use crate::remediation::{apply_status, RemediationOutcome};
use crate::store::{fetch_snapshot, InventoryReader, InventoryWriter};

/// Frozen inventory records, indexed by trimmed IMEI. On a shared IMEI the
/// first scannable record wins, else the first record.
#[derive(Debug)]
struct Snapshot {
    records: Vec<InventoryRecord>,
    by_imei: HashMap<String, usize>,
}

impl Snapshot {
    fn new(records: Vec<InventoryRecord>) -> Self {
        let mut by_imei = HashMap::with_capacity(records.len());
        for (idx, rec) in records.iter().enumerate() {
            let imei = rec.imei.trim();
            if imei.is_empty() {
                log::warn!("record '{}' has no IMEI and can never be scanned", rec.id);
                continue;
            }
            match by_imei.get(imei).copied() {
                None => {
                    by_imei.insert(imei.to_string(), idx);
                }
                // A scannable record shadows an earlier non-scannable one
                // (a handset bought back keeps its old sold record).
                Some(prev) if !records[prev].status.is_scannable() && rec.status.is_scannable() => {
                    log::warn!(
                        "duplicate IMEI {imei} in snapshot, indexing record '{}' over '{}'",
                        rec.id, records[prev].id
                    );
                    by_imei.insert(imei.to_string(), idx);
                }
                Some(prev) => {
                    log::warn!(
                        "duplicate IMEI {imei} in snapshot, keeping record '{}' over '{}'",
                        records[prev].id, rec.id
                    );
                }
            }
        }
        Self { records, by_imei }
    }

    fn lookup(&self, imei: &str) -> Option<&InventoryRecord> {
        self.by_imei.get(imei).and_then(|&idx| self.records.get(idx))
    }

    fn contains_id(&self, record_id: &str) -> bool {
        self.records.iter().any(|r| r.id == record_id)
    }
}

#[derive(Debug)]
struct ActiveState {
    snapshot: Snapshot,
    baseline: SessionBaseline,
    scan_log: Vec<ScanEvent>,
    accepted: HashSet<String>,
    started_at: DateTime<Utc>,
}

#[derive(Debug)]
struct FinalizedState {
    snapshot: Snapshot,
    report: FinalizeReport,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Active(ActiveState),
    Finalized(FinalizedState),
}

/// A single operator's reconciliation session.
#[derive(Debug)]
pub struct ReconSession<N: NotificationSink = NullSink> {
    phase: Phase,
    sink: N,
}

impl ReconSession<NullSink> {
    pub fn new() -> Self {
        Self::with_sink(NullSink)
    }
}

impl Default for ReconSession<NullSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NotificationSink> ReconSession<N> {
    pub fn with_sink(sink: N) -> Self {
        Self { phase: Phase::Idle, sink }
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn phase(&self) -> SessionPhase {
        match self.phase {
            Phase::Idle => SessionPhase::Idle,
            Phase::Active(_) => SessionPhase::Active,
            Phase::Finalized(_) => SessionPhase::Finalized,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Start a session over `records`. Accepted from `Idle` and `Finalized`.
    pub fn start(&mut self, records: Vec<InventoryRecord>) -> Result<&SessionBaseline, ReconError> {
        self.begin(records, true)
    }

    /// Fetch a snapshot from `reader` and start. A failed fetch still starts
    /// the session, with an empty non-authoritative baseline.
    pub fn start_from(
        &mut self,
        reader: &dyn InventoryReader,
        scope: &str,
    ) -> Result<&SessionBaseline, ReconError> {
        self.ensure_not_active("start")?;
        match fetch_snapshot(reader, scope) {
            Ok(records) => self.begin(records, true),
            Err(err) => {
                log::warn!("starting scope '{scope}' without a snapshot: {err}");
                self.sink.notify(Notification::SnapshotUnavailable { message: err.to_string() });
                self.begin(Vec::new(), false)
            }
        }
    }

    fn begin(
        &mut self,
        records: Vec<InventoryRecord>,
        authoritative: bool,
    ) -> Result<&SessionBaseline, ReconError> {
        self.ensure_not_active("start")?;

        let baseline = if authoritative {
            SessionBaseline::from_records(&records)
        } else {
            SessionBaseline::unavailable()
        };
        log::info!(
            "session started: {} expected of {} record(s)",
            baseline.expected_total,
            records.len()
        );
        self.sink.notify(Notification::SessionStarted {
            expected_total: baseline.expected_total,
            authoritative: baseline.authoritative,
        });

        self.phase = Phase::Active(ActiveState {
            snapshot: Snapshot::new(records),
            baseline,
            scan_log: Vec::new(),
            accepted: HashSet::new(),
            started_at: Utc::now(),
        });

        match &self.phase {
            Phase::Active(active) => Ok(&active.baseline),
            _ => Err(ReconError::InvalidTransition { phase: self.phase(), action: "start" }),
        }
    }

    /// Resolve one scanned IMEI.
    ///
    /// Blank input returns `Ok(None)` and leaves no trace. Rejections are
    /// returned as errors and also sent to the sink; only unknown IMEIs are
    /// written to the scan log.
    pub fn scan(&mut self, raw: &str) -> Result<Option<ScanReceipt>, ReconError> {
        let phase = self.phase();
        let Phase::Active(active) = &mut self.phase else {
            return Err(ReconError::InvalidTransition { phase, action: "scan" });
        };

        let imei = raw.trim();
        if imei.is_empty() {
            return Ok(None);
        }

        let Some(record) = active.snapshot.lookup(imei) else {
            log::debug!("scan {imei}: not in snapshot");
            active.scan_log.push(ScanEvent {
                imei: imei.to_string(),
                scanned_at: Utc::now(),
                outcome: ScanOutcome::NotFound,
            });
            self.sink.notify(Notification::ScanRejected {
                imei: imei.to_string(),
                reason: RejectReason::UnknownImei,
            });
            return Err(ReconError::UnknownImei(imei.to_string()));
        };

        let status = record.status;
        if !status.is_scannable() {
            log::debug!("scan {imei}: status {status} is not scannable");
            self.sink.notify(Notification::ScanRejected {
                imei: imei.to_string(),
                reason: RejectReason::NonScannableStatus(status),
            });
            return Err(ReconError::NonScannableStatus { imei: imei.to_string(), status });
        }

        if active.accepted.contains(imei) {
            log::debug!("scan {imei}: duplicate");
            self.sink.notify(Notification::ScanRejected {
                imei: imei.to_string(),
                reason: RejectReason::Duplicate,
            });
            return Err(ReconError::DuplicateScan(imei.to_string()));
        }

        let record_id = record.id.clone();
        active.accepted.insert(imei.to_string());
        active.scan_log.push(ScanEvent {
            imei: imei.to_string(),
            scanned_at: Utc::now(),
            outcome: ScanOutcome::Found { record_id: record_id.clone(), status },
        });

        let counters = live_counters(&active.baseline, &active.scan_log);
        log::debug!("scan {imei}: accepted as record '{record_id}' ({status})");
        self.sink.notify(Notification::ScanAccepted {
            imei: imei.to_string(),
            status,
            pending_to_scan: counters.pending_to_scan,
        });

        Ok(Some(ScanReceipt {
            imei: imei.to_string(),
            record_id,
            status,
            remaining_for_status: counters.remaining_for(status),
            pending_to_scan: counters.pending_to_scan,
        }))
    }

    /// Freeze the scan log and compute the missing-records report.
    pub fn finalize(&mut self) -> Result<&FinalizeReport, ReconError> {
        let phase = self.phase();
        if phase != SessionPhase::Active {
            return Err(ReconError::InvalidTransition { phase, action: "finalize" });
        }
        let Phase::Active(active) = std::mem::replace(&mut self.phase, Phase::Idle) else {
            return Err(ReconError::InvalidTransition { phase, action: "finalize" });
        };

        let missing: Vec<InventoryRecord> = active
            .snapshot
            .records
            .iter()
            .filter(|r| r.status.is_scannable() && !active.accepted.contains(r.imei.trim()))
            .cloned()
            .collect();

        let scanned = active.accepted.len();
        let unknown_scans = active.scan_log.iter().filter(|e| e.found_status().is_none()).count();
        let outcome = classify(scanned, active.baseline.expected_total, missing.len());

        if outcome == SessionOutcome::Incomplete {
            log::warn!(
                "counts inconsistent: {scanned} scanned of {} expected, no missing IMEI",
                active.baseline.expected_total
            );
        }
        log::info!("session finalized: {outcome}, {} missing", missing.len());
        self.sink.notify(Notification::SessionFinalized { outcome, missing: missing.len() });

        let report = FinalizeReport {
            outcome,
            expected_total: active.baseline.expected_total,
            scanned,
            unknown_scans,
            baseline: active.baseline,
            missing,
            scan_log: active.scan_log,
            started_at: active.started_at,
            finalized_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        self.phase = Phase::Finalized(FinalizedState { snapshot: active.snapshot, report });
        match &self.phase {
            Phase::Finalized(done) => Ok(&done.report),
            _ => Err(ReconError::InvalidTransition { phase: self.phase(), action: "finalize" }),
        }
    }

    /// Drop all session state. Accepted from any phase.
    pub fn reset(&mut self) {
        if matches!(self.phase, Phase::Active(_)) {
            log::info!("active session discarded");
        }
        self.phase = Phase::Idle;
    }

    fn ensure_not_active(&self, action: &'static str) -> Result<(), ReconError> {
        match self.phase {
            Phase::Active(_) => Err(ReconError::InvalidTransition { phase: SessionPhase::Active, action }),
            _ => Ok(()),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn baseline(&self) -> Option<&SessionBaseline> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Active(active) => Some(&active.baseline),
            Phase::Finalized(done) => Some(&done.report.baseline),
        }
    }

    pub fn scan_log(&self) -> &[ScanEvent] {
        match &self.phase {
            Phase::Idle => &[],
            Phase::Active(active) => &active.scan_log,
            Phase::Finalized(done) => &done.report.scan_log,
        }
    }

    /// Live counters. `None` unless the session is active.
    pub fn live_counters(&self) -> Option<LiveCounters> {
        match &self.phase {
            Phase::Active(active) => Some(live_counters(&active.baseline, &active.scan_log)),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&FinalizeReport> {
        match &self.phase {
            Phase::Finalized(done) => Some(&done.report),
            _ => None,
        }
    }

    /// Current missing-records view. Empty unless finalized.
    pub fn missing_records(&self) -> &[InventoryRecord] {
        self.report().map(|r| r.missing.as_slice()).unwrap_or(&[])
    }

    /// Whether `fresh` differs from the snapshot this session was started
    /// on. The baseline is never rebuilt; callers decide what to do.
    pub fn snapshot_drift(&self, fresh: &[InventoryRecord]) -> Option<bool> {
        self.baseline().map(|b| b.fingerprint != snapshot_fingerprint(fresh))
    }

    // ── Remediation ─────────────────────────────────────────────────

    /// Mark a missing record as lost in the store and drop it from the
    /// missing view. Calling it again for the same record is a no-op.
    pub fn mark_lost(
        &mut self,
        writer: &dyn InventoryWriter,
        record_id: &str,
        note: &str,
    ) -> Result<RemediationOutcome, ReconError> {
        let phase = self.phase();
        let Phase::Finalized(done) = &mut self.phase else {
            return Err(ReconError::InvalidTransition { phase, action: "mark lost" });
        };

        let Some(pos) = done.report.missing.iter().position(|r| r.id == record_id) else {
            if done.snapshot.contains_id(record_id) {
                log::debug!("record '{record_id}' is not in the missing list, nothing to do");
                return Ok(RemediationOutcome::AlreadyResolved);
            }
            return Err(ReconError::RecordNotFound(record_id.to_string()));
        };

        apply_status(writer, &mut self.sink, record_id, RemediationAction::MarkLost, note)?;
        done.report.missing.remove(pos);
        Ok(RemediationOutcome::Applied)
    }
}

/// Derive counters from the baseline and the scan log.
fn live_counters(baseline: &SessionBaseline, scan_log: &[ScanEvent]) -> LiveCounters {
    let mut scanned_by_status: BTreeMap<Status, i64> = BTreeMap::new();
    let mut scanned = 0usize;
    for status in scan_log.iter().filter_map(ScanEvent::found_status) {
        *scanned_by_status.entry(status).or_insert(0) += 1;
        scanned += 1;
    }

    let remaining = baseline
        .counts
        .iter()
        .map(|(status, &count)| {
            let seen = scanned_by_status.get(status).copied().unwrap_or(0);
            (*status, count as i64 - seen)
        })
        .collect();

    LiveCounters {
        expected_total: baseline.expected_total,
        scanned,
        pending_to_scan: baseline.expected_total as i64 - scanned as i64,
        remaining,
    }
}

/// Identity check first: any missing record is a discrepancy even when the
/// totals agree.
pub fn classify(scanned: usize, expected_total: usize, missing: usize) -> SessionOutcome {
    if missing > 0 {
        SessionOutcome::Discrepancy
    } else if scanned == expected_total {
        SessionOutcome::Complete
    } else {
        SessionOutcome::Incomplete
    }
}
