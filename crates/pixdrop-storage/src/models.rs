// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical [`ImageRecord`] is defined in `pixdrop-core` for use across
//! adapter trait boundaries. This module re-exports it and owns the text
//! encoding of timestamps in the `images` table.

use chrono::{DateTime, SecondsFormat, Utc};

pub use pixdrop_core::types::ImageRecord;

/// Encodes a timestamp as fixed-width RFC 3339 text, so that text order is time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decodes a timestamp written by [`format_timestamp`] (or any RFC 3339 text).
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|ts| ts.with_timezone(&Utc))
}
