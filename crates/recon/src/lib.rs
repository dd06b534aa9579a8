//! `stockcheck-recon`: stock reconciliation session engine.
//!
//! Pure engine crate: receives an inventory snapshot and scanned IMEIs,
//! returns live counters and a missing-devices report. The inventory store
//! and operator notifications are reached only through the traits in
//! [`store`] and [`notify`].

pub mod baseline;
pub mod error;
pub mod filter;
pub mod model;
pub mod notify;
pub mod remediation;
pub mod session;
pub mod store;
pub mod summary;

pub use baseline::SessionBaseline;
pub use error::ReconError;
pub use filter::RecordFilter;
pub use model::{
    FinalizeReport, InventoryRecord, LiveCounters, ScanEvent, ScanOutcome, ScanReceipt,
    SessionOutcome, SessionPhase, Status,
};
pub use notify::{Notification, NotificationSink, NullSink, RecordingSink};
pub use remediation::RemediationOutcome;
pub use session::ReconSession;
pub use store::{InventoryReader, InventoryWriter, MemoryInventory, StoreError};
pub use summary::StatusSummary;
