// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway serving stored images.
//!
//! Reads go through [`ImageQueryService`], a read-through TTL cache in front
//! of the [`ImageStore`](pixdrop_core::ImageStore). The router exposes the
//! raw image bytes, a paginated JSON listing, an HTML gallery and a health
//! endpoint.

pub mod error;
pub mod handlers;
pub mod html;
pub mod query;
pub mod server;

pub use error::ApiError;
pub use query::{CachedValue, ImageQueryService};
pub use server::{AppState, router, serve};
