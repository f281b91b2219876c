//! Conversation state machine.
//!
//! Each inbound event is handled to completion while its session is locked:
//!
//! ```text
//!   /start ──► AwaitingLanguageChoice ──label──► Translating ──text──► translate + reply
//!                   │    ▲                          │  ▲
//!                   └────┘ unknown text             └──┘ label (re-select)
//! ```
//!
//! Recoverable failures (unknown label, provider down, transport hiccups) end
//! here as chat replies or log lines; nothing is returned to the caller as an error.

use crate::eraser::{EraseReport, HistoryEraser};
use crate::language::{LanguagePair, LanguageSelector};
use crate::message::{ChatId, Command, EventKind, InboundEvent, MessageId, ReplyMarkup};
use crate::replies;
use crate::session::{ConversationState, Session, SessionKey, SessionStore};
use crate::traits::Transport;
use crate::translator::{TranslateError, Translator};
use babel_common::util::{sanitize_for_log, truncate_with_ellipsis};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Default upper bound on one translation call.
pub const DEFAULT_TRANSLATE_TIMEOUT: Duration = Duration::from_secs(10);

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Language menu shown
    Prompted,
    /// First unrecognized entry: interaction ended, menu shown
    Ended,
    /// Later unrecognized entry: asked again
    Reprompted,
    LanguageChosen(LanguagePair),
    Translated,
    /// Provider failed; apology sent
    TranslationFailed,
    DeleteOffered,
    HistoryErased(EraseReport),
    Ignored,
}

/// Routes events to the selector, the translator, or the eraser.
pub struct Conversation {
    sessions: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    translator: Arc<dyn Translator>,
    selector: LanguageSelector,
    translate_timeout: Duration,
}

impl Conversation {
    pub fn new(
        sessions: Arc<SessionStore>,
        transport: Arc<dyn Transport>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            sessions,
            transport,
            translator,
            selector: LanguageSelector::new(),
            translate_timeout: DEFAULT_TRANSLATE_TIMEOUT,
        }
    }

    pub fn with_translate_timeout(mut self, timeout: Duration) -> Self {
        self.translate_timeout = timeout;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one inbound event.
    pub async fn handle(&self, event: InboundEvent) -> Outcome {
        let span = tracing::info_span!(
            "event",
            trace_id = %event.trace_id,
            chat_id = %event.chat_id,
            user_id = %event.user_id,
            kind = event.kind_str(),
        );

        async move {
            let key = SessionKey::new(event.chat_id, event.user_id);
            let session = self.sessions.get_or_create(key);
            let mut session = session.lock().await;

            let outcome = self.dispatch(event, &mut session).await;
            tracing::debug!(?outcome, state = ?session.state(), "Event handled");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, event: InboundEvent, session: &mut Session) -> Outcome {
        let chat_id = event.chat_id;

        match event.kind {
            EventKind::Command {
                command: Command::Start,
                ..
            } => self.prompt(chat_id, session).await,
            EventKind::Command {
                command: Command::Delete,
                ..
            } => self.offer_delete(chat_id).await,
            EventKind::Command {
                command: Command::Other(name),
                ..
            } => {
                tracing::debug!(command = %name, "Ignoring unknown command");
                Outcome::Ignored
            }
            EventKind::Text { message_id, text } => match session.state() {
                ConversationState::AwaitingLanguageChoice => {
                    self.choose_language(chat_id, session, &text).await
                }
                ConversationState::Translating if self.selector.is_label(&text) => {
                    self.choose_language(chat_id, session, &text).await
                }
                ConversationState::Translating => {
                    self.translate(chat_id, session, message_id, &text).await
                }
            },
            EventKind::Callback {
                callback_id,
                message_id,
                data,
            } => {
                self.handle_callback(chat_id, session, &callback_id, message_id, &data)
                    .await
            }
        }
    }

    async fn prompt(&self, chat_id: ChatId, session: &mut Session) -> Outcome {
        session.await_language_choice();
        self.reply(
            chat_id,
            replies::GREETING,
            Some(replies::start_keyboard(&self.selector)),
        )
        .await;
        Outcome::Prompted
    }

    async fn choose_language(&self, chat_id: ChatId, session: &mut Session, text: &str) -> Outcome {
        match self.selector.select(text) {
            Ok(pair) => {
                session.choose_pair(pair);
                tracing::info!(pair = %pair, "Language pair selected");
                self.reply(
                    chat_id,
                    &replies::confirmation(pair),
                    Some(replies::translating_keyboard(&self.selector)),
                )
                .await;
                Outcome::LanguageChosen(pair)
            }
            Err(rejected) if !session.prompted() => {
                tracing::debug!(%rejected, "First entry not a language choice, ending interaction");
                self.prompt(chat_id, session).await;
                Outcome::Ended
            }
            Err(rejected) => {
                tracing::debug!(%rejected, "Re-prompting for language choice");
                self.reply(
                    chat_id,
                    replies::REPROMPT,
                    Some(replies::start_keyboard(&self.selector)),
                )
                .await;
                Outcome::Reprompted
            }
        }
    }

    async fn translate(
        &self,
        chat_id: ChatId,
        session: &mut Session,
        message_id: MessageId,
        text: &str,
    ) -> Outcome {
        let Some(pair) = session.pair() else {
            // Translating always carries a pair; fall back to the menu if not.
            return self.prompt(chat_id, session).await;
        };

        session.record(message_id);

        let text = text.trim();
        let result = tokio::time::timeout(self.translate_timeout, self.translator.translate(text, pair))
            .await
            .unwrap_or_else(|_| {
                Err(TranslateError::Unavailable(format!(
                    "no answer within {:?}",
                    self.translate_timeout
                )))
            });

        let (reply, outcome) = match result {
            Ok(translated) => (translated, Outcome::Translated),
            Err(e) => {
                tracing::warn!(
                    pair = %pair,
                    error = %e,
                    text = %truncate_with_ellipsis(text, 80),
                    "Translation failed"
                );
                (replies::APOLOGY.to_string(), Outcome::TranslationFailed)
            }
        };

        // Failed exchanges are recorded too, so /delete also removes the apology.
        if let Some(reply_id) = self.reply(chat_id, &reply, None).await {
            session.record(reply_id);
            return outcome;
        }

        // The translation never reached the user: one apology attempt, no retry.
        if outcome == Outcome::Translated {
            if let Some(apology_id) = self.reply(chat_id, replies::APOLOGY, None).await {
                session.record(apology_id);
            }
        }
        Outcome::TranslationFailed
    }

    async fn offer_delete(&self, chat_id: ChatId) -> Outcome {
        self.reply(
            chat_id,
            replies::DELETE_PROMPT,
            Some(replies::delete_keyboard()),
        )
        .await;
        Outcome::DeleteOffered
    }

    async fn handle_callback(
        &self,
        chat_id: ChatId,
        session: &mut Session,
        callback_id: &str,
        message_id: MessageId,
        data: &str,
    ) -> Outcome {
        if let Err(e) = self.transport.answer_callback(callback_id).await {
            tracing::warn!(error = %sanitize_for_log(&e.to_string()), "Failed to answer callback");
        }

        if data != replies::DELETE_HISTORY_CALLBACK {
            tracing::debug!(data = %data, "Ignoring unknown callback");
            return Outcome::Ignored;
        }

        let report = HistoryEraser::new(self.transport.as_ref())
            .erase(chat_id, session.history_mut())
            .await;
        tracing::info!(
            attempted = report.attempted,
            deleted = report.deleted,
            failed = report.failed.len(),
            "Translation history erased"
        );

        if let Err(e) = self
            .transport
            .edit_message_text(chat_id, message_id, replies::HISTORY_CLEARED)
            .await
        {
            tracing::warn!(error = %sanitize_for_log(&e.to_string()), "Failed to confirm history erase");
        }

        Outcome::HistoryErased(report)
    }

    /// Send a reply, logging instead of failing.
    async fn reply(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Option<MessageId> {
        match self.transport.send_text(chat_id, text, markup).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(error = %sanitize_for_log(&e.to_string()), "Failed to send reply");
                None
            }
        }
    }
}
