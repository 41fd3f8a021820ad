// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message routing, authorization filtering, and event decoding.
//!
//! Determines whether an incoming Telegram message should be processed
//! based on authorization rules and chat type, then decodes it into a
//! transport-agnostic [`InboundEvent`]. Media is referenced by file id and
//! only downloaded when the event is ingested.

use pixdrop_core::{ImageEvent, InboundEvent, MediaSource};
use teloxide::prelude::*;
use teloxide::types::ChatKind;

use crate::media;

/// Checks whether the message sender is authorized.
///
/// Authorization passes if the sender's user ID (as string) or username
/// matches any entry in the `allowed_users` list. If `allowed_users` is
/// empty, all messages are rejected (secure default).
///
/// Messages without a sender (e.g., channel posts) always return `false`.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    let user_id = user.id.0.to_string();

    allowed_users.iter().any(|allowed| {
        if *allowed == user_id {
            return true;
        }
        let allowed = allowed.strip_prefix('@').unwrap_or(allowed);
        user.username
            .as_deref()
            .is_some_and(|username| username.eq_ignore_ascii_case(allowed))
    })
}

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Decodes a Telegram message into an inbound event.
///
/// Message ids are only unique per chat, so the event id is `<chat>-<message>`.
/// The sender is the chat id, which is also where notices are sent back.
pub fn to_inbound_event(msg: &Message) -> InboundEvent {
    let message_id = format!("{}-{}", msg.chat.id.0, msg.id.0);
    let sender = msg.chat.id.0.to_string();

    if let Some(photo) = msg.photo().and_then(media::largest_photo) {
        return InboundEvent::Image(ImageEvent {
            message_id,
            sender,
            timestamp: Some(msg.date),
            mime_type: Some(media::PHOTO_MIME.to_string()),
            caption: msg.caption().map(str::to_string),
            media: MediaSource::Remote(photo.file.id.0.clone()),
        });
    }

    if let Some(doc) = msg.document() {
        if let Some(mime) = media::image_document_mime(doc) {
            return InboundEvent::Image(ImageEvent {
                message_id,
                sender,
                timestamp: Some(msg.date),
                mime_type: Some(mime),
                caption: msg.caption().map(str::to_string),
                media: MediaSource::Remote(doc.file.id.0.clone()),
            });
        }
        return InboundEvent::Other {
            message_id: Some(message_id),
            sender: Some(sender),
            kind: "document".to_string(),
        };
    }

    if let Some(text) = msg.text() {
        return InboundEvent::Text {
            message_id,
            sender,
            text: text.to_string(),
        };
    }

    InboundEvent::Other {
        message_id: Some(message_id),
        sender: Some(sender),
        kind: "unsupported".to_string(),
    }
}
