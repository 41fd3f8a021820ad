// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event image ingestion.
//!
//! Each inbound image becomes one [`ImageRecord`]. A successful store is
//! silent. Malformed events are dropped without a reply. Any other failure,
//! duplicates included, triggers one best-effort text notification whose own
//! failure is only logged.

use std::sync::Arc;

use chrono::Utc;
use pixdrop_core::{
    ImageEvent, ImageRecord, ImageStore, InboundEvent, MediaSource, MessagingTransport,
    PixdropError,
};
use tracing::{debug, error, info, warn};

/// What happened to one inbound event.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The image was persisted.
    Stored { message_id: String },
    /// The event carried no image.
    Ignored,
    /// The image event was malformed and dropped without notifying anyone.
    Dropped { reason: String },
    /// Persisting failed; the sender was notified on a best-effort basis.
    Failed {
        message_id: String,
        error: PixdropError,
    },
}

/// Turns inbound image events into stored records.
pub struct ImageIngestor {
    transport: Arc<dyn MessagingTransport>,
    store: Arc<dyn ImageStore>,
    notify_target: Option<String>,
}

impl ImageIngestor {
    /// `notify_target` overrides the sender as the recipient of failure notices.
    pub fn new(
        transport: Arc<dyn MessagingTransport>,
        store: Arc<dyn ImageStore>,
        notify_target: Option<String>,
    ) -> Self {
        Self {
            transport,
            store,
            notify_target,
        }
    }

    /// Processes one inbound event to completion.
    pub async fn handle(&self, event: InboundEvent) -> IngestOutcome {
        let image = match event {
            InboundEvent::Image(image) => image,
            other => {
                debug!(kind = other.kind(), sender = ?other.sender(), "ignoring non-image event");
                return IngestOutcome::Ignored;
            }
        };

        let message_id = image.message_id.clone();
        let sender = image.sender.clone();
        match self.store_image(image).await {
            Ok(()) => {
                info!(message_id = %message_id, sender = %sender, "image stored");
                IngestOutcome::Stored { message_id }
            }
            Err(PixdropError::MalformedEvent(reason)) => {
                warn!(message_id = %message_id, sender = %sender, reason = %reason, "dropping malformed image event");
                IngestOutcome::Dropped { reason }
            }
            Err(error) => {
                if matches!(error, PixdropError::DuplicateRecord { .. }) {
                    warn!(message_id = %message_id, sender = %sender, "duplicate image rejected");
                } else {
                    error!(message_id = %message_id, sender = %sender, error = %error, "failed to store image");
                }
                self.notify_failure(&sender, &error).await;
                IngestOutcome::Failed { message_id, error }
            }
        }
    }

    async fn store_image(&self, image: ImageEvent) -> Result<(), PixdropError> {
        if image.message_id.trim().is_empty() {
            return Err(PixdropError::MalformedEvent(
                "image event has no message id".to_string(),
            ));
        }

        let content_type = image.content_type().to_string();
        let image_data = match image.media {
            MediaSource::Inline(bytes) => bytes,
            ref remote @ MediaSource::Remote(_) => self.transport.download(remote).await?,
        };
        if image_data.is_empty() {
            return Err(PixdropError::MalformedEvent(format!(
                "image event {} has an empty payload",
                image.message_id
            )));
        }

        let record = ImageRecord {
            message_id: image.message_id,
            sender: image.sender,
            timestamp: image.timestamp.unwrap_or_else(Utc::now),
            image_data,
            content_type,
            caption: image.caption.unwrap_or_default(),
        };
        self.store.insert_image(&record).await
    }

    async fn notify_failure(&self, sender: &str, error: &PixdropError) {
        let target = self.notify_target.as_deref().unwrap_or(sender);
        if target.is_empty() {
            debug!("no notification target for failed ingest");
            return;
        }
        let text = failure_notice(error);
        if let Err(e) = self.transport.send_text(target, &text).await {
            warn!(target, error = %e, "failed to send ingest failure notice");
        }
    }
}

/// User-facing text for a failed ingest.
pub fn failure_notice(error: &PixdropError) -> String {
    match error {
        PixdropError::DuplicateRecord { message_id } => {
            format!("Image {message_id} was already saved.")
        }
        _ => "Sorry, your image could not be saved. Please try again later.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_notice_names_the_message() {
        let text = failure_notice(&PixdropError::DuplicateRecord {
            message_id: "m1".into(),
        });
        assert!(text.contains("m1"));
    }

    #[test]
    fn storage_notice_hides_details() {
        let text = failure_notice(&PixdropError::Connection {
            message: "secret-host:27017 refused".into(),
        });
        assert!(!text.contains("secret-host"));
    }
}
