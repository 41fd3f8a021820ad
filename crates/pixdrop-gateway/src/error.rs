// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of service errors into HTTP responses.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use pixdrop_core::PixdropError;
use tracing::error;

const GENERIC_ERROR: &str = "Internal server error";

/// A plain-text error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn not_found(resource: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("{resource} not found"),
        }
    }

    /// Maps a service error to a response.
    ///
    /// Server errors are logged. Their detail only reaches the client when
    /// `expose_details` is set (development environment).
    pub fn from_error(err: PixdropError, expose_details: bool) -> Self {
        match err {
            PixdropError::NotFound { resource } => Self::not_found(resource),
            other => {
                error!(error = %other, "request failed");
                let message = if expose_details {
                    other.to_string()
                } else {
                    GENERIC_ERROR.to_string()
                };
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message,
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}
