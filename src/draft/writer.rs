// ABOUTME: Debounced background writer for wizard drafts
// Coalesces rapid snapshots into one write per quiet window; failed writes
// stay pending and retry on the next tick

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DraftError, DraftStore};
use crate::wizard::DraftRecord;

enum WriterMsg {
    Save(DraftRecord),
    Delete(Uuid),
    Flush(oneshot::Sender<Result<(), String>>),
}

/// Handle to the background draft writer task.
///
/// Scheduling a save never blocks the caller; the snapshot is written after
/// the debounce window passes with no newer snapshot arriving.
#[derive(Debug, Clone)]
pub struct DraftWriter {
    tx: mpsc::UnboundedSender<WriterMsg>,
}

impl DraftWriter {
    /// Spawn the writer task against the given store
    pub fn spawn(store: Arc<dyn DraftStore>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, rx, debounce));
        Self { tx }
    }

    /// Queue a snapshot; supersedes any snapshot still waiting for its tick
    pub fn schedule_save(&self, record: DraftRecord) {
        if self.tx.send(WriterMsg::Save(record)).is_err() {
            warn!("Draft writer task is gone; snapshot dropped");
        }
    }

    /// Drop any pending snapshot and remove the stored draft
    pub fn delete(&self, draft_id: Uuid) {
        if self.tx.send(WriterMsg::Delete(draft_id)).is_err() {
            warn!("Draft writer task is gone; delete dropped");
        }
    }

    /// Force any pending snapshot to disk now
    pub async fn flush(&self) -> Result<(), DraftError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(WriterMsg::Flush(reply_tx))
            .map_err(|_| DraftError::WriterClosed)?;
        match reply_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(DraftError::Io(std::io::Error::other(message))),
            Err(_) => Err(DraftError::WriterClosed),
        }
    }
}

async fn run_writer(
    store: Arc<dyn DraftStore>,
    mut rx: mpsc::UnboundedReceiver<WriterMsg>,
    debounce: Duration,
) {
    let mut pending: Option<DraftRecord> = None;

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(WriterMsg::Save(record)) => {
                    pending = Some(record);
                }
                Some(WriterMsg::Delete(draft_id)) => {
                    pending = None;
                    if let Err(e) = store.delete(draft_id) {
                        warn!("Failed to delete draft {}: {}", draft_id, e);
                    }
                }
                Some(WriterMsg::Flush(reply)) => {
                    let result = match pending.take() {
                        Some(record) => write_snapshot(store.as_ref(), record, &mut pending),
                        None => Ok(()),
                    };
                    let _ = reply.send(result.map_err(|e| e.to_string()));
                }
                None => {
                    // Channel closed: last chance to persist what we hold
                    if let Some(record) = pending.take() {
                        let _ = write_snapshot(store.as_ref(), record, &mut pending);
                    }
                    break;
                }
            },
            () = tokio::time::sleep(debounce), if pending.is_some() => {
                if let Some(record) = pending.take() {
                    let _ = write_snapshot(store.as_ref(), record, &mut pending);
                }
            }
        }
    }
}

/// Attempt one write; on failure the snapshot goes back to pending so the
/// next tick retries it.
fn write_snapshot(
    store: &dyn DraftStore,
    record: DraftRecord,
    pending: &mut Option<DraftRecord>,
) -> Result<(), DraftError> {
    match store.save(&record) {
        Ok(()) => {
            debug!("Persisted draft {}", record.draft_id);
            Ok(())
        }
        Err(e) => {
            warn!("Failed to persist draft {}: {}; will retry", record.draft_id, e);
            *pending = Some(record);
            Err(e)
        }
    }
}
