use crate::error::ReconError;
use crate::notify::{Notification, NotificationSink, RemediationAction};
use crate::store::InventoryWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// The store accepted the status change.
    Applied,
    /// Nothing to do; the record is no longer in the missing view.
    AlreadyResolved,
}

/// Return a record to `available`, e.g. a device marked lost that turned up
/// later. Independent of any session.
pub fn mark_found<N: NotificationSink + ?Sized>(
    writer: &dyn InventoryWriter,
    sink: &mut N,
    record_id: &str,
    note: &str,
) -> Result<(), ReconError> {
    apply_status(writer, sink, record_id, RemediationAction::MarkFound, note)
}

/// Mark a single record lost without a session, e.g. from an operator
/// command. Sessions use [`crate::ReconSession::mark_lost`] instead so the
/// missing view stays in sync.
pub fn mark_lost_record<N: NotificationSink + ?Sized>(
    writer: &dyn InventoryWriter,
    sink: &mut N,
    record_id: &str,
    note: &str,
) -> Result<(), ReconError> {
    apply_status(writer, sink, record_id, RemediationAction::MarkLost, note)
}

pub(crate) fn apply_status<N: NotificationSink + ?Sized>(
    writer: &dyn InventoryWriter,
    sink: &mut N,
    record_id: &str,
    action: RemediationAction,
    note: &str,
) -> Result<(), ReconError> {
    let status = action.target_status();
    match writer.update_status(record_id, status, note) {
        Ok(()) => {
            log::info!("{action}: record '{record_id}' is now {status}");
            sink.notify(Notification::RemediationSucceeded { record_id: record_id.to_string(), action });
            Ok(())
        }
        Err(err) => {
            log::warn!("{action}: record '{record_id}' update failed: {err}");
            sink.notify(Notification::RemediationFailed {
                record_id: record_id.to_string(),
                action,
                message: err.message.clone(),
            });
            Err(ReconError::ExternalWriteFailure { record_id: record_id.to_string(), message: err.message })
        }
    }
}
