//! Babel Bot - a Telegram translation relay.
//!
//! Users pick a direction from a menu ("Translate to Spanish" / "Translate to
//! English"), then every text they send is translated and answered. `/delete`
//! removes the recorded exchange from the chat.
//!
//! ## Architecture
//!
//! ```text
//! Telegram ─getUpdates─► TelegramChannel ─mpsc─► Dispatcher ─► per-session worker
//!                                                                   │
//!                                                              Conversation
//!                                                     ┌─────────────┼─────────────┐
//!                                              LanguageSelector  Translator  HistoryEraser
//!                                                                   │
//! Telegram ◄────────────── sendMessage / deleteMessage ◄── Transport ┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod conversation;
pub mod dispatcher;
pub mod eraser;
pub mod language;
pub mod message;
pub mod replies;
pub mod session;
pub mod telegram;
pub mod traits;
pub mod translator;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use conversation::{Conversation, Outcome};
pub use dispatcher::Dispatcher;
pub use eraser::{EraseReport, HistoryEraser};
pub use language::{Language, LanguagePair, LanguageSelector, SelectionRejected};
pub use message::{ChatId, Command, EventKind, InboundEvent, MessageId, ReplyMarkup, UserId};
pub use session::{ConversationState, Session, SessionKey, SessionStore};
pub use telegram::TelegramChannel;
pub use traits::{ChannelError, ChannelResult, Transport};
pub use translator::{GoogleTranslator, TranslateError, Translator};

use anyhow::Context;
use babel_common::config::{Config, BOT_TOKEN_ENV};
use babel_common::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Inbound events buffered between the poller and the dispatcher.
const EVENT_BUFFER: usize = 100;

/// Run the bot until Ctrl-C or until polling fails for good.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let token = config
        .bot_token()
        .ok_or_else(|| Error::ConfigurationMissing(BOT_TOKEN_ENV.to_string()))?;

    let telegram = TelegramChannel::new(token.to_string(), config.telegram.allowed_users.clone())
        .with_api_base(config.telegram.api_base.clone())
        .with_poll_timeout(config.telegram.poll_timeout_secs);
    telegram
        .init()
        .await
        .context("Telegram rejected the bot token")?;
    let telegram = Arc::new(telegram);

    let translator = Arc::new(
        GoogleTranslator::new(&config.translator).context("Failed to set up translator")?,
    );

    let conversation = Arc::new(
        Conversation::new(Arc::new(SessionStore::new()), telegram.clone(), translator)
            .with_translate_timeout(Duration::from_secs(config.translator.timeout_secs)),
    );

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let dispatcher = Arc::new(Dispatcher::new(conversation)).spawn(rx);

    let poller = telegram.clone();
    let mut listener = tokio::spawn(async move { poller.listen(tx).await });

    tracing::info!(
        allowed_users = ?config.telegram.allowed_users,
        translator = %config.translator.endpoint,
        "Babel bot running"
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            listener.abort();
        }
        res = &mut listener => {
            match res {
                Ok(Ok(())) => tracing::info!("Telegram listener finished"),
                Ok(Err(e)) => {
                    dispatcher.abort();
                    return Err(e).context("Telegram polling stopped");
                }
                Err(e) => {
                    dispatcher.abort();
                    return Err(e).context("Telegram listener task failed");
                }
            }
        }
    }

    dispatcher.abort();
    Ok(())
}
