// ABOUTME: Media attachment manager - ordered attachments with stable identity
// All mutations flow through one queue so rapid edits cannot corrupt ordering

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

mod store;

pub use store::{AssetStore, AssetStoreError, HttpAssetStore, MemoryAssetStore};

/// What kind of media an attachment holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    FloorPlan,
    Document,
}

/// One ordered attachment within a listing.
///
/// `id` is assigned once and never changes; `order` is recomputed on every
/// mutation so the set of orders is always exactly `0..N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: Uuid,
    pub uri: String,
    pub order: usize,
    pub kind: MediaKind,
    pub filename: String,
}

/// Errors from media mutations
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Attachment limit of {limit} reached")]
    CapacityExceeded { limit: usize },
    #[error("No attachment with id {0}")]
    NotFound(Uuid),
    #[error("Asset upload failed: {0}")]
    Store(#[from] AssetStoreError),
    #[error("Media worker is no longer running")]
    Closed,
}

enum MediaCommand {
    Add {
        bytes: Vec<u8>,
        filename: String,
        kind: MediaKind,
        reply: oneshot::Sender<Result<MediaAttachment, MediaError>>,
    },
    Remove {
        id: Uuid,
        reply: oneshot::Sender<Result<(), MediaError>>,
    },
    Reorder {
        id: Uuid,
        new_index: usize,
        reply: oneshot::Sender<Result<(), MediaError>>,
    },
    List {
        reply: oneshot::Sender<Vec<MediaAttachment>>,
    },
}

/// Handle to the media worker; cheap to clone.
///
/// Every operation is executed by one worker task in arrival order, so
/// concurrent calls cannot interleave their order bookkeeping.
#[derive(Debug, Clone)]
pub struct MediaManager {
    tx: mpsc::Sender<MediaCommand>,
}

impl MediaManager {
    /// Spawn the worker with the given asset store and capacity limit
    pub fn spawn(store: Arc<dyn AssetStore>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run_worker(store, rx, capacity));
        Self { tx }
    }

    /// Upload bytes and append the attachment at the end of the order.
    ///
    /// The capacity check happens locally before any network call.
    pub async fn add(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        kind: MediaKind,
    ) -> Result<MediaAttachment, MediaError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(MediaCommand::Add {
                bytes,
                filename: filename.to_string(),
                kind,
                reply,
            })
            .await
            .map_err(|_| MediaError::Closed)?;
        rx.await.map_err(|_| MediaError::Closed)?
    }

    /// Remove an attachment and close the gap in the order sequence
    pub async fn remove(&self, id: Uuid) -> Result<(), MediaError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(MediaCommand::Remove { id, reply })
            .await
            .map_err(|_| MediaError::Closed)?;
        rx.await.map_err(|_| MediaError::Closed)?
    }

    /// Move an attachment to `new_index`, reindexing everything else.
    /// A target past the end clamps to the last position.
    pub async fn reorder(&self, id: Uuid, new_index: usize) -> Result<(), MediaError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(MediaCommand::Reorder { id, new_index, reply })
            .await
            .map_err(|_| MediaError::Closed)?;
        rx.await.map_err(|_| MediaError::Closed)?
    }

    /// Ordered snapshot of the current attachments
    pub async fn list(&self) -> Result<Vec<MediaAttachment>, MediaError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(MediaCommand::List { reply })
            .await
            .map_err(|_| MediaError::Closed)?;
        rx.await.map_err(|_| MediaError::Closed)
    }
}

async fn run_worker(
    store: Arc<dyn AssetStore>,
    mut rx: mpsc::Receiver<MediaCommand>,
    capacity: usize,
) {
    let mut attachments: Vec<MediaAttachment> = Vec::new();

    while let Some(command) = rx.recv().await {
        match command {
            MediaCommand::Add {
                bytes,
                filename,
                kind,
                reply,
            } => {
                let result = handle_add(&store, &mut attachments, capacity, bytes, filename, kind)
                    .await;
                let _ = reply.send(result);
            }
            MediaCommand::Remove { id, reply } => {
                let _ = reply.send(handle_remove(&mut attachments, id));
            }
            MediaCommand::Reorder { id, new_index, reply } => {
                let _ = reply.send(handle_reorder(&mut attachments, id, new_index));
            }
            MediaCommand::List { reply } => {
                let _ = reply.send(attachments.clone());
            }
        }
        debug_assert!(orders_contiguous(&attachments));
    }
    debug!("Media worker shutting down with {} attachments", attachments.len());
}

async fn handle_add(
    store: &Arc<dyn AssetStore>,
    attachments: &mut Vec<MediaAttachment>,
    capacity: usize,
    bytes: Vec<u8>,
    filename: String,
    kind: MediaKind,
) -> Result<MediaAttachment, MediaError> {
    if attachments.len() >= capacity {
        warn!("Rejecting attachment {}: limit of {} reached", filename, capacity);
        return Err(MediaError::CapacityExceeded { limit: capacity });
    }

    // The upload happens inside the worker loop: later commands wait until
    // the new attachment's position is settled
    let uri = store.store(bytes, &filename).await?;

    let attachment = MediaAttachment {
        id: Uuid::new_v4(),
        uri,
        order: attachments.len(),
        kind,
        filename,
    };
    attachments.push(attachment.clone());
    debug!("Added attachment {} at order {}", attachment.id, attachment.order);
    Ok(attachment)
}

fn handle_remove(attachments: &mut Vec<MediaAttachment>, id: Uuid) -> Result<(), MediaError> {
    let index = attachments
        .iter()
        .position(|a| a.id == id)
        .ok_or(MediaError::NotFound(id))?;
    attachments.remove(index);
    reindex(attachments);
    debug!("Removed attachment {}", id);
    Ok(())
}

fn handle_reorder(
    attachments: &mut Vec<MediaAttachment>,
    id: Uuid,
    new_index: usize,
) -> Result<(), MediaError> {
    let index = attachments
        .iter()
        .position(|a| a.id == id)
        .ok_or(MediaError::NotFound(id))?;
    let attachment = attachments.remove(index);
    let target = new_index.min(attachments.len());
    attachments.insert(target, attachment);
    reindex(attachments);
    debug!("Moved attachment {} to order {}", id, target);
    Ok(())
}

/// Recompute `order` so the sequence is contiguous from zero
fn reindex(attachments: &mut [MediaAttachment]) {
    for (order, attachment) in attachments.iter_mut().enumerate() {
        attachment.order = order;
    }
}

fn orders_contiguous(attachments: &[MediaAttachment]) -> bool {
    attachments.iter().enumerate().all(|(i, a)| a.order == i)
}
