// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimal HTML gallery page.

use std::fmt::Write;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use pixdrop_core::ImageRecord;

/// Everything outside the RFC 3986 unreserved set.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Renders every record as a thumbnail linking to the full image.
pub fn render_gallery(records: &[ImageRecord], total: u64) -> String {
    let mut page = String::with_capacity(512 + records.len() * 256);
    page.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Pixdrop</title>\n</head>\n<body>\n<h1>Pixdrop</h1>\n",
    );
    let _ = writeln!(page, "<p>{total} images</p>");

    if records.is_empty() {
        page.push_str("<p>No images yet.</p>\n");
    } else {
        page.push_str("<ul>\n");
        for record in records {
            let path = encode_path_segment(&record.message_id);
            let caption = escape(&record.caption);
            let _ = writeln!(
                page,
                "<li><a href=\"/api/image/{path}\"><img src=\"/api/image/{path}\" alt=\"{caption}\" width=\"240\"></a>\
                 <p>{caption}</p><p>{sender} at {time} \
                 <a href=\"/api/image/{path}/download\">Download</a></p></li>",
                sender = escape(&record.sender),
                time = record.timestamp.to_rfc3339(),
            );
        }
        page.push_str("</ul>\n");
    }

    page.push_str("</body>\n</html>\n");
    page
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
