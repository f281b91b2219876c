//! Telegram channel adapter.
//!
//! Long-polls the Bot API for updates and implements [`Transport`] on top of
//! `sendMessage`, `deleteMessage`, `answerCallbackQuery`, and `editMessageText`.

pub mod markup;

use crate::message::{ChatId, Command, EventKind, InboundEvent, MessageId, ReplyMarkup, UserId};
use crate::traits::{ChannelError, ChannelResult, Transport};
use async_trait::async_trait;
use babel_common::logging::generate_trace_id;
use babel_common::util::{sanitize_for_log, truncate_with_ellipsis};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// Telegram rejects longer texts.
const MAX_MESSAGE_LEN: usize = 4096;

/// Timeout for calls other than the long poll.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Telegram channel - long-polls the Bot API for updates.
pub struct TelegramChannel {
    bot_token: String,
    allowed_users: Vec<String>,
    api_base: String,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel against the public Bot API.
    pub fn new(bot_token: String, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            client: reqwest::Client::new(),
        }
    }

    /// Point the channel at another Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the `getUpdates` long-poll timeout.
    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    fn is_user_allowed(&self, identity: &str) -> bool {
        self.allowed_users.iter().any(|u| u == "*" || u == identity)
    }

    fn is_any_user_allowed<'a, I>(&self, identities: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        identities.into_iter().any(|id| self.is_user_allowed(id))
    }

    /// Call a Bot API method and return its `result`.
    async fn call(&self, method: &'static str, body: &Value) -> ChannelResult<Value> {
        self.call_with_timeout(method, body, REQUEST_TIMEOUT).await
    }

    async fn call_with_timeout(
        &self,
        method: &'static str,
        body: &Value,
        timeout: Duration,
    ) -> ChannelResult<Value> {
        let resp = self
            .client
            .post(self.api_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::Connection(sanitize_for_log(&e.to_string())))?;

        let status = resp.status();
        let data: Value = resp.json().await.map_err(|e| {
            ChannelError::InvalidResponse(format!(
                "{method} ({status}): {}",
                sanitize_for_log(&e.to_string())
            ))
        })?;

        if data.get("ok").and_then(Value::as_bool) == Some(true) {
            return Ok(data.get("result").cloned().unwrap_or(Value::Null));
        }

        let description = data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let error_code = data
            .get("error_code")
            .and_then(Value::as_u64)
            .unwrap_or(u64::from(status.as_u16()));

        match error_code {
            // An unknown token answers 404 on every method.
            401 | 404 => Err(ChannelError::Auth(description)),
            429 => {
                let retry_after_secs = data
                    .get("parameters")
                    .and_then(|p| p.get("retry_after"))
                    .and_then(Value::as_u64)
                    .unwrap_or(1);
                Err(ChannelError::RateLimited { retry_after_secs })
            }
            _ => Err(ChannelError::Api {
                method,
                description,
            }),
        }
    }

    /// Verify the bot token by calling `getMe`.
    pub async fn init(&self) -> ChannelResult<()> {
        let me = self.call("getMe", &serde_json::json!({})).await?;
        let username = me.get("username").and_then(Value::as_str).unwrap_or("unknown");
        tracing::info!(bot = %username, "Telegram channel initialized");
        Ok(())
    }

    /// Poll for updates and forward them as events until `tx` is closed.
    pub async fn listen(&self, tx: mpsc::Sender<InboundEvent>) -> ChannelResult<()> {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for messages...");

        loop {
            if tx.is_closed() {
                tracing::info!("Event receiver closed, stopping Telegram poll");
                return Ok(());
            }

            let body = serde_json::json!({
                "offset": offset,
                "timeout": self.poll_timeout_secs,
                "allowed_updates": ["message", "callback_query"]
            });

            let poll_timeout = Duration::from_secs(self.poll_timeout_secs) + REQUEST_TIMEOUT;
            let results = match self.call_with_timeout("getUpdates", &body, poll_timeout).await {
                Ok(r) => r,
                Err(ChannelError::Auth(e)) => return Err(ChannelError::Auth(e)),
                Err(ChannelError::RateLimited { retry_after_secs }) => {
                    tracing::warn!(retry_after_secs, "Telegram poll rate limited");
                    tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            let Some(updates) = results.as_array() else {
                continue;
            };

            for update in updates {
                if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                    offset = uid + 1;
                }

                let Some(event) = self.parse_update(update) else {
                    continue;
                };

                tracing::info!(
                    trace_id = %event.trace_id,
                    chat_id = %event.chat_id,
                    user_id = %event.user_id,
                    kind = event.kind_str(),
                    "Telegram update received"
                );

                if tx.send(event).await.is_err() {
                    tracing::info!("Event receiver closed, stopping Telegram poll");
                    return Ok(());
                }
            }
        }
    }

    /// Turn a raw update into an event.
    ///
    /// Returns `None` for unsupported updates (stickers, photos, edits) and for
    /// users outside `allowed_users`.
    pub fn parse_update(&self, update: &Value) -> Option<InboundEvent> {
        if let Some(callback) = update.get("callback_query") {
            return self.parse_callback_query(callback);
        }

        let message = update.get("message")?;
        let chat_id = message.get("chat")?.get("id")?.as_i64()?;
        let from = message.get("from")?;
        let user_id = from.get("id")?.as_i64()?;
        let username = from.get("username").and_then(Value::as_str);

        if !self.is_authorized(user_id, username) {
            return None;
        }

        let message_id = MessageId(message.get("message_id")?.as_i64()?);
        let text = message.get("text")?.as_str()?;

        let kind = match Command::parse(text) {
            Some(command) => EventKind::Command {
                message_id,
                command,
            },
            None => EventKind::Text {
                message_id,
                text: text.to_string(),
            },
        };

        Some(InboundEvent {
            chat_id: ChatId(chat_id),
            user_id: UserId(user_id),
            username: username.map(String::from),
            kind,
            trace_id: generate_trace_id(),
        })
    }

    fn parse_callback_query(&self, callback: &Value) -> Option<InboundEvent> {
        let callback_id = callback.get("id")?.as_str()?.to_string();
        let data = callback.get("data")?.as_str()?.to_string();

        let from = callback.get("from")?;
        let user_id = from.get("id")?.as_i64()?;
        let username = from.get("username").and_then(Value::as_str);

        if !self.is_authorized(user_id, username) {
            return None;
        }

        let message = callback.get("message")?;
        let chat_id = message.get("chat")?.get("id")?.as_i64()?;
        let message_id = MessageId(message.get("message_id")?.as_i64()?);

        Some(InboundEvent {
            chat_id: ChatId(chat_id),
            user_id: UserId(user_id),
            username: username.map(String::from),
            kind: EventKind::Callback {
                callback_id,
                message_id,
                data,
            },
            trace_id: generate_trace_id(),
        })
    }

    fn is_authorized(&self, user_id: i64, username: Option<&str>) -> bool {
        let id = user_id.to_string();
        let mut identities = vec![id.as_str()];
        if let Some(name) = username {
            identities.push(name);
        }

        let allowed = self.is_any_user_allowed(identities);
        if !allowed {
            tracing::warn!(
                user_id,
                username = username.unwrap_or("unknown"),
                "Telegram: ignoring update from unauthorized user"
            );
        }
        allowed
    }
}

#[async_trait]
impl Transport for TelegramChannel {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> ChannelResult<MessageId> {
        let text = truncate_with_ellipsis(text, MAX_MESSAGE_LEN - 3);
        let mut body = serde_json::json!({
            "chat_id": chat_id.0,
            "text": text,
        });
        if let Some(markup) = markup {
            body["reply_markup"] = markup::to_reply_markup(&markup);
        }

        let result = self.call("sendMessage", &body).await.map_err(|e| match e {
            ChannelError::Api { description, .. } => ChannelError::SendFailed(description),
            other => other,
        })?;

        result
            .get("message_id")
            .and_then(Value::as_i64)
            .map(MessageId)
            .ok_or_else(|| ChannelError::InvalidResponse("Missing message_id in sendMessage result".into()))
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> ChannelResult<()> {
        let body = serde_json::json!({
            "chat_id": chat_id.0,
            "message_id": message_id.0,
        });
        self.call("deleteMessage", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> ChannelResult<()> {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> ChannelResult<()> {
        let body = serde_json::json!({
            "chat_id": chat_id.0,
            "message_id": message_id.0,
            "text": text,
        });
        self.call("editMessageText", &body).await?;
        Ok(())
    }
}
