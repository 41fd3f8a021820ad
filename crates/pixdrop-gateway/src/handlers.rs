// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles GET /, GET /health, GET /api/images, GET /api/image/{id} and
//! GET /api/image/{id}/download.

use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use pixdrop_core::{ConnectionStatus, ImageRecord, SessionState};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::html;
use crate::server::AppState;

/// Image bytes never change for a given id.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000";
const LIST_CACHE_CONTROL: &str = "public, max-age=300";
const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Query parameters for GET /api/images.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when the store is connected, `degraded` otherwise.
    pub status: &'static str,
    pub database_connection_state: ConnectionStatus,
    pub session_state: SessionState,
    /// RFC 3339 time of the check.
    pub timestamp: String,
}

#[derive(Clone, Copy)]
enum Disposition {
    Inline,
    Attachment,
}

/// GET /api/image/{id}
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    serve_image(&state, &id, Disposition::Inline).await
}

/// GET /api/image/{id}/download
pub async fn download_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    serve_image(&state, &id, Disposition::Attachment).await
}

async fn serve_image(
    state: &AppState,
    id: &str,
    disposition: Disposition,
) -> Result<Response, ApiError> {
    let record = state
        .images
        .get_by_id(id)
        .await
        .map_err(|e| state.api_error(e))?
        .ok_or_else(|| ApiError::not_found("Image"))?;

    let content_type = HeaderValue::from_str(&record.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = content_disposition(&record, disposition);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(record.image_data.clone()),
    )
        .into_response())
}

fn content_disposition(record: &ImageRecord, disposition: Disposition) -> HeaderValue {
    let kind = match disposition {
        Disposition::Inline => "inline",
        Disposition::Attachment => "attachment",
    };
    let stem: String = record
        .message_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "{kind}; filename=\"{stem}.{ext}\"",
        ext = record.file_extension()
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("inline"))
}

/// GET /api/images?page=&limit=
pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(state.default_page_size);
    let records = state
        .images
        .list_page(page, limit)
        .await
        .map_err(|e| state.api_error(e))?;
    let total = state.images.count().await.map_err(|e| state.api_error(e))?;

    let mut response = Json(records.as_slice()).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(LIST_CACHE_CONTROL),
    );
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(total));
    Ok(response)
}

/// GET /
pub async fn gallery(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let records = state
        .images
        .list_all()
        .await
        .map_err(|e| state.api_error(e))?;
    let total = state.images.count().await.map_err(|e| state.api_error(e))?;
    Ok(Html(html::render_gallery(&records, total)))
}

/// GET /health
///
/// Always 200; a disconnected store is reported as `degraded`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_connection_state = state.store.connection_status();
    let status = if database_connection_state == ConnectionStatus::Connected {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status,
        database_connection_state,
        session_state: *state.session_state.borrow(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
