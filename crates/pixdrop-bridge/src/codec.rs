// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frames exchanged with the bridge sidecar.
//!
//! Client to bridge:
//! - `{"type":"hello","credentials":{...}}`
//! - `{"type":"send_text","to":"...","text":"...","request_id":"..."}`
//!
//! Bridge to client:
//! - `{"type":"open"}`
//! - `{"type":"close","reason":"logged_out"}`
//! - `{"type":"message","id":"...","sender":"...","kind":"image",...}`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeZone, Utc};
use pixdrop_core::{
    CloseReason, Credentials, ImageEvent, InboundEvent, MediaSource, PixdropError,
    TransportEvent,
};
use serde::{Deserialize, Serialize};

/// Frames sent to the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame<'a> {
    Hello {
        credentials: &'a Credentials,
    },
    SendText {
        to: &'a str,
        text: &'a str,
        request_id: &'a str,
    },
}

impl ClientFrame<'_> {
    pub fn encode(&self) -> Result<String, PixdropError> {
        serde_json::to_string(self).map_err(|e| PixdropError::Transport {
            message: "failed to encode bridge frame".to_string(),
            source: Some(Box::new(e)),
        })
    }
}

/// Frames received from the bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeFrame {
    Open,
    Close {
        #[serde(default)]
        reason: Option<String>,
    },
    Message(WireMessage),
    #[serde(other)]
    Unknown,
}

/// Body of a `message` frame.
#[derive(Debug, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub kind: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Base64 image bytes.
    #[serde(default)]
    pub data: Option<String>,
    /// Where to download the image bytes when `data` is absent.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Decodes one text frame. `Ok(None)` means the frame type is not one we act on.
pub fn decode_frame(text: &str) -> Result<Option<TransportEvent>, PixdropError> {
    let frame: BridgeFrame = serde_json::from_str(text)
        .map_err(|e| PixdropError::MalformedEvent(format!("invalid bridge frame: {e}")))?;
    Ok(match frame {
        BridgeFrame::Open => Some(TransportEvent::Open),
        BridgeFrame::Close { reason } => Some(TransportEvent::Closed(close_reason(
            reason.as_deref(),
        ))),
        BridgeFrame::Message(message) => Some(TransportEvent::Message(decode_message(message)?)),
        BridgeFrame::Unknown => None,
    })
}

/// Parses a close reason; a missing or blank reason means the connection was lost.
pub fn close_reason(reason: Option<&str>) -> CloseReason {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => reason.parse().unwrap_or(CloseReason::ConnectionLost),
        None => CloseReason::ConnectionLost,
    }
}

fn decode_message(message: WireMessage) -> Result<InboundEvent, PixdropError> {
    match (message.kind.as_str(), message.id, message.sender) {
        ("image", Some(id), Some(sender)) => {
            let media = match (message.data, message.url) {
                (Some(data), _) => MediaSource::Inline(STANDARD.decode(data.as_bytes()).map_err(
                    |e| PixdropError::MalformedEvent(format!("image {id} has invalid base64: {e}")),
                )?),
                (None, Some(url)) => MediaSource::Remote(url),
                (None, None) => {
                    return Err(PixdropError::MalformedEvent(format!(
                        "image {id} carries neither data nor url"
                    )));
                }
            };
            Ok(InboundEvent::Image(ImageEvent {
                message_id: id,
                sender,
                timestamp: message.timestamp.and_then(unix_seconds),
                mime_type: message.mime_type,
                caption: message.caption,
                media,
            }))
        }
        ("image", _, _) => Err(PixdropError::MalformedEvent(
            "image message without id or sender".to_string(),
        )),
        ("text", Some(message_id), Some(sender)) => Ok(InboundEvent::Text {
            message_id,
            sender,
            text: message.text.unwrap_or_default(),
        }),
        (_, message_id, sender) => Ok(InboundEvent::Other {
            message_id,
            sender,
            kind: message.kind,
        }),
    }
}

fn unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}
