//! Transport trait: the chat operations the conversation core calls back into.

use crate::message::{ChatId, MessageId, ReplyMarkup};
use async_trait::async_trait;

/// Result type for transport operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Transport error type.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("{method} rejected: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Outbound chat operations.
///
/// Implementations must be safe to call from many sessions at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message, optionally with a keyboard. Returns the new message's id.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> ChannelResult<MessageId>;

    /// Delete a message from a chat.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> ChannelResult<()>;

    /// Acknowledge an inline button press.
    async fn answer_callback(&self, callback_id: &str) -> ChannelResult<()>;

    /// Replace the text of an existing message.
    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> ChannelResult<()>;
}
