// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Transports and stores extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod credentials;
pub mod store;
pub mod transport;

pub use adapter::PluginAdapter;
pub use credentials::CredentialStore;
pub use store::ImageStore;
pub use transport::MessagingTransport;
