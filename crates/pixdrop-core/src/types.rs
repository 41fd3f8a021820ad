// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and Pixdrop services.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// MIME type assumed for image events that do not declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Unique identifier for a message sent through a transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Storage,
}

/// The persisted unit: one image received through the messaging transport.
///
/// Created once when an inbound image event is decoded and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Transport message id. Unique across all records.
    pub message_id: String,
    /// Identifier of the originating account.
    pub sender: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Raw image bytes, base64 encoded in JSON.
    #[serde(with = "base64_bytes")]
    pub image_data: Vec<u8>,
    /// MIME type of `image_data`.
    pub content_type: String,
    /// Caption text, empty when the sender gave none.
    #[serde(default)]
    pub caption: String,
}

impl ImageRecord {
    /// Creates a record stamped with the current time and an empty caption.
    pub fn new(
        message_id: impl Into<String>,
        sender: impl Into<String>,
        content_type: impl Into<String>,
        image_data: Vec<u8>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            sender: sender.into(),
            timestamp: Utc::now(),
            image_data,
            content_type: content_type.into(),
            caption: String::new(),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// File extension matching the content type, used for download filenames.
    pub fn file_extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/heic" => "heic",
            "image/bmp" => "bmp",
            _ => "jpg",
        }
    }
}

/// Where the bytes of an inbound image live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Bytes delivered with the event.
    Inline(Vec<u8>),
    /// A transport-specific reference (file id or URL) that must be downloaded.
    Remote(String),
}

/// An inbound message that carries an image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEvent {
    pub message_id: String,
    pub sender: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
    pub media: MediaSource,
}

impl ImageEvent {
    /// The declared MIME type, or [`DEFAULT_IMAGE_MIME`] when absent or blank.
    pub fn content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME)
    }
}

/// Inbound message events delivered by a messaging transport.
///
/// Transports decode their wire format into one of these variants; anything
/// the application does not act on lands in [`InboundEvent::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Image(ImageEvent),
    Text {
        message_id: String,
        sender: String,
        text: String,
    },
    Other {
        message_id: Option<String>,
        sender: Option<String>,
        kind: String,
    },
}

impl InboundEvent {
    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &str {
        match self {
            InboundEvent::Image(_) => "image",
            InboundEvent::Text { .. } => "text",
            InboundEvent::Other { kind, .. } => kind,
        }
    }

    pub fn sender(&self) -> Option<&str> {
        match self {
            InboundEvent::Image(img) => Some(&img.sender),
            InboundEvent::Text { sender, .. } => Some(sender),
            InboundEvent::Other { sender, .. } => sender.as_deref(),
        }
    }
}

/// Why a transport connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The account was logged out; credentials must be re-acquired.
    LoggedOut,
    ConnectionLost,
    ConnectionReplaced,
    RestartRequired,
    TimedOut,
    Other(String),
}

impl CloseReason {
    /// Only a logout ends the session for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CloseReason::LoggedOut)
    }
}

impl FromStr for CloseReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Ok(match normalized.as_str() {
            "logged_out" | "loggedout" => CloseReason::LoggedOut,
            "connection_lost" | "connectionlost" => CloseReason::ConnectionLost,
            "connection_replaced" | "connectionreplaced" => CloseReason::ConnectionReplaced,
            "restart_required" | "restartrequired" => CloseReason::RestartRequired,
            "timed_out" | "timedout" => CloseReason::TimedOut,
            _ => CloseReason::Other(s.to_string()),
        })
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::LoggedOut => write!(f, "logged_out"),
            CloseReason::ConnectionLost => write!(f, "connection_lost"),
            CloseReason::ConnectionReplaced => write!(f, "connection_replaced"),
            CloseReason::RestartRequired => write!(f, "restart_required"),
            CloseReason::TimedOut => write!(f, "timed_out"),
            CloseReason::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// Lifecycle events reported by a messaging transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed; messages may follow.
    Open,
    /// The connection closed.
    Closed(CloseReason),
    /// An inbound message.
    Message(InboundEvent),
}

/// Status of a managed connection to a backing store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// States of the messaging session controller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Init,
    Connecting,
    Open,
    ClosedRecoverable,
    ClosedTerminal,
}

/// Opaque session credentials handed to a transport on connect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(pub serde_json::Value);

impl Credentials {
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Serde adapter encoding byte buffers as standard base64 strings.
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_event_defaults_to_jpeg() {
        let mut event = ImageEvent {
            message_id: "m1".into(),
            sender: "s1".into(),
            timestamp: None,
            mime_type: None,
            caption: None,
            media: MediaSource::Inline(vec![1, 2, 3]),
        };
        assert_eq!(event.content_type(), "image/jpeg");

        event.mime_type = Some("  ".into());
        assert_eq!(event.content_type(), "image/jpeg");

        event.mime_type = Some("image/png".into());
        assert_eq!(event.content_type(), "image/png");
    }

    #[test]
    fn close_reason_parses_known_values() {
        assert_eq!("logged_out".parse::<CloseReason>().unwrap(), CloseReason::LoggedOut);
        assert_eq!("loggedOut".parse::<CloseReason>().unwrap(), CloseReason::LoggedOut);
        assert_eq!(
            "connection-lost".parse::<CloseReason>().unwrap(),
            CloseReason::ConnectionLost
        );
        assert_eq!(
            "bad session".parse::<CloseReason>().unwrap(),
            CloseReason::Other("bad session".into())
        );
    }

    #[test]
    fn only_logged_out_is_terminal() {
        assert!(CloseReason::LoggedOut.is_terminal());
        assert!(!CloseReason::ConnectionLost.is_terminal());
        assert!(!CloseReason::RestartRequired.is_terminal());
        assert!(!CloseReason::Other("x".into()).is_terminal());
    }

    #[test]
    fn image_record_json_encodes_bytes_as_base64() {
        let record = ImageRecord::new("m1", "s1", "image/png", vec![0, 1, 2, 255]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["image_data"], "AAEC/w==");
        assert_eq!(json["caption"], "");

        let back: ImageRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn status_enums_render_snake_case() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
        assert_eq!(SessionState::ClosedTerminal.to_string(), "closed_terminal");
        assert_eq!(
            serde_json::to_string(&SessionState::ClosedRecoverable).unwrap(),
            "\"closed_recoverable\""
        );
    }

    #[test]
    fn credentials_emptiness() {
        assert!(Credentials::default().is_empty());
        assert!(Credentials(serde_json::json!({})).is_empty());
        assert!(!Credentials(serde_json::json!({"me": "x"})).is_empty());
    }

    #[test]
    fn file_extension_follows_content_type() {
        let png = ImageRecord::new("a", "b", "image/png", vec![]);
        let other = ImageRecord::new("a", "b", "application/octet-stream", vec![]);
        assert_eq!(png.file_extension(), "png");
        assert_eq!(other.file_extension(), "jpg");
    }
}
