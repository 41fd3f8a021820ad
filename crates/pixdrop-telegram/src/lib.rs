// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport for Pixdrop.
//!
//! Implements [`MessagingTransport`] for the Telegram Bot API via teloxide
//! long polling. Photos and image documents sent to the bot in a private
//! chat by an allowed user become image events.

pub mod handler;
pub mod media;

use std::sync::Arc;

use async_trait::async_trait;
use pixdrop_config::model::TelegramConfig;
use pixdrop_core::{
    AdapterType, CloseReason, Credentials, HealthStatus, MediaSource, MessageId,
    MessagingTransport, PixdropError, PluginAdapter, TransportEvent,
};
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

/// Buffered events between the polling task and `next_event`.
const EVENT_BUFFER: usize = 100;

/// Telegram transport implementing [`MessagingTransport`].
pub struct TelegramTransport {
    bot: Bot,
    allowed_users: Arc<Vec<String>>,
    events: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    polling_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TelegramTransport {
    /// Creates a new Telegram transport.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, PixdropError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            PixdropError::Config("telegram.bot_token is required for the Telegram transport".into())
        })?;

        if token.is_empty() {
            return Err(PixdropError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
            allowed_users: Arc::new(config.allowed_users.clone()),
            events: Mutex::new(None),
            polling_handle: Mutex::new(None),
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    fn spawn_polling(&self, tx: mpsc::Sender<TransportEvent>) -> tokio::task::JoinHandle<()> {
        let bot = self.bot.clone();
        let allowed_users = Arc::clone(&self.allowed_users);

        tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                let allowed = Arc::clone(&allowed_users);
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }
                    if !handler::is_authorized(&msg, &allowed) {
                        debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                        return respond(());
                    }

                    let event = handler::to_inbound_event(&msg);
                    if tx.send(TransportEvent::Message(event)).await.is_err() {
                        warn!("event channel closed, dropping message");
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        })
    }
}

/// Maps a `getMe` failure. An invalid token means the bot was revoked.
fn classify_get_me_error(err: &RequestError) -> Option<CloseReason> {
    match err {
        RequestError::Api(ApiError::InvalidToken) => Some(CloseReason::LoggedOut),
        _ => None,
    }
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, PixdropError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), PixdropError> {
        self.disconnect().await
    }
}

#[async_trait]
impl MessagingTransport for TelegramTransport {
    /// The bot token is the only credential; stored session credentials are unused.
    async fn connect(&self, _credentials: &Credentials) -> Result<(), PixdropError> {
        self.disconnect().await?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        *self.events.lock().await = Some(rx);

        match self.bot.get_me().await {
            Ok(me) => {
                info!(username = ?me.user.username, "starting Telegram long polling");
                let _ = tx.send(TransportEvent::Open).await;
                *self.polling_handle.lock().await = Some(self.spawn_polling(tx));
                Ok(())
            }
            Err(e) => match classify_get_me_error(&e) {
                Some(reason) => {
                    warn!(error = %e, "Telegram rejected the bot token");
                    let _ = tx.send(TransportEvent::Closed(reason)).await;
                    Ok(())
                }
                None => Err(PixdropError::Transport {
                    message: format!("Telegram getMe failed: {e}"),
                    source: Some(Box::new(e)),
                }),
            },
        }
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        let mut guard = self.events.lock().await;
        guard.as_mut()?.recv().await
    }

    async fn download(&self, media: &MediaSource) -> Result<Vec<u8>, PixdropError> {
        match media {
            MediaSource::Inline(bytes) => Ok(bytes.clone()),
            MediaSource::Remote(file_id) => media::download_file(&self.bot, file_id).await,
        }
    }

    async fn send_text(&self, to: &str, text: &str) -> Result<MessageId, PixdropError> {
        let chat_id = to
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| PixdropError::transport(format!("invalid chat id {to:?}: {e}")))?;

        let sent = self
            .bot
            .send_message(chat_id, text)
            .await
            .map_err(|e| PixdropError::Transport {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn disconnect(&self) -> Result<(), PixdropError> {
        if let Some(handle) = self.polling_handle.lock().await.take() {
            handle.abort();
            debug!("Telegram polling stopped");
        }
        *self.events.lock().await = None;
        Ok(())
    }
}
