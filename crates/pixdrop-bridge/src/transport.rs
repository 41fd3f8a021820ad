// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket client for the bridge sidecar.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use pixdrop_config::model::BridgeConfig;
use pixdrop_core::{
    AdapterType, Credentials, HealthStatus, MediaSource, MessageId, MessagingTransport,
    PixdropError, PluginAdapter, TransportEvent,
};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use crate::codec::{ClientFrame, close_reason, decode_frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

const ADAPTER_NAME: &str = "bridge";

/// Messaging transport that talks JSON frames to a sidecar over WebSocket.
///
/// The sidecar owns the real messaging protocol session. Images referenced by
/// URL are fetched with a plain HTTP client.
pub struct BridgeTransport {
    url: String,
    connect_timeout: Duration,
    http: reqwest::Client,
    writer: Mutex<Option<WsWriter>>,
    reader: Mutex<Option<WsReader>>,
    request_seq: AtomicU64,
}

impl BridgeTransport {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            url: config.url.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            http: reqwest::Client::new(),
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            request_seq: AtomicU64::new(0),
        }
    }

    async fn send_frame(&self, frame: &ClientFrame<'_>) -> Result<(), PixdropError> {
        let json = frame.encode()?;
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| PixdropError::transport("bridge is not connected"))?;
        writer
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| transport_error("failed to write to bridge", e))
    }

    async fn pong(&self, payload: tokio_tungstenite::tungstenite::Bytes) {
        if let Some(writer) = self.writer.lock().await.as_mut() {
            let _ = writer.send(WsMessage::Pong(payload)).await;
        }
    }
}

fn transport_error(
    message: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> PixdropError {
    PixdropError::Transport {
        message: message.to_string(),
        source: Some(Box::new(source)),
    }
}

#[async_trait]
impl PluginAdapter for BridgeTransport {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, PixdropError> {
        if self.writer.lock().await.is_some() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded("not connected to bridge".to_string()))
        }
    }

    async fn shutdown(&self) -> Result<(), PixdropError> {
        self.disconnect().await
    }
}

#[async_trait]
impl MessagingTransport for BridgeTransport {
    async fn connect(&self, credentials: &Credentials) -> Result<(), PixdropError> {
        self.disconnect().await?;

        let (stream, _) = timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| PixdropError::Timeout {
                duration: self.connect_timeout,
            })?
            .map_err(|e| transport_error("failed to connect to bridge", e))?;

        let (writer, reader) = stream.split();
        *self.writer.lock().await = Some(writer);
        *self.reader.lock().await = Some(reader);
        info!(url = %self.url, "connected to bridge");

        self.send_frame(&ClientFrame::Hello { credentials }).await
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        let mut guard = self.reader.lock().await;
        let reader = guard.as_mut()?;

        loop {
            let text = match reader.next().await {
                Some(Ok(WsMessage::Text(text))) => text.as_str().to_owned(),
                Some(Ok(WsMessage::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => text,
                    Err(_) => {
                        warn!("dropping non-UTF-8 binary frame from bridge");
                        continue;
                    }
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    *guard = None;
                    let reason = frame.as_ref().map(|f| f.reason.as_str());
                    debug!(reason = ?reason, "bridge closed the websocket");
                    return Some(TransportEvent::Closed(close_reason(reason)));
                }
                Some(Ok(WsMessage::Ping(payload))) => {
                    self.pong(payload).await;
                    continue;
                }
                Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "bridge websocket error");
                    *guard = None;
                    return None;
                }
                None => {
                    *guard = None;
                    return None;
                }
            };

            match decode_frame(&text) {
                Ok(Some(event)) => return Some(event),
                Ok(None) => trace!("ignoring bridge frame"),
                Err(e) => warn!(error = %e, "dropping malformed bridge frame"),
            }
        }
    }

    async fn download(&self, media: &MediaSource) -> Result<Vec<u8>, PixdropError> {
        let url = match media {
            MediaSource::Inline(bytes) => return Ok(bytes.clone()),
            MediaSource::Remote(url) => url,
        };
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| transport_error("failed to download media", e))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error("failed to read media body", e))?;
        debug!(url = %url, size = bytes.len(), "downloaded media");
        Ok(bytes.to_vec())
    }

    async fn send_text(&self, to: &str, text: &str) -> Result<MessageId, PixdropError> {
        let seq = self.request_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let request_id = format!("pixdrop-{seq}");
        self.send_frame(&ClientFrame::SendText {
            to,
            text,
            request_id: &request_id,
        })
        .await?;
        Ok(MessageId(request_id))
    }

    async fn disconnect(&self) -> Result<(), PixdropError> {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.close().await;
            debug!("bridge connection closed");
        }
        *self.reader.lock().await = None;
        Ok(())
    }
}
