//! In-memory fakes for unit tests.

use crate::language::LanguagePair;
use crate::message::{ChatId, MessageId, ReplyMarkup};
use crate::traits::{ChannelError, ChannelResult, Transport};
use crate::translator::{TranslateError, Translator};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

/// Transport that records every call and hands out sequential message ids.
#[derive(Default)]
pub struct RecordingTransport {
    next_id: AtomicI64,
    fail_sends: AtomicBool,
    pending_send_failures: AtomicUsize,
    delete_attempts: AtomicUsize,
    sent: Mutex<Vec<SentMessage>>,
    deleted: Mutex<Vec<MessageId>>,
    failing_deletes: Mutex<HashSet<MessageId>>,
    answered: Mutex<Vec<String>>,
    edits: Mutex<Vec<(ChatId, MessageId, String)>>,
}

impl RecordingTransport {
    /// Outgoing ids start at 1000 so they never collide with test inbound ids.
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            ..Self::default()
        }
    }

    pub fn fail_delete(&self, message_id: MessageId) {
        self.failing_deletes.lock().unwrap().insert(message_id);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Fail only the next `count` sends.
    pub fn fail_next_sends(&self, count: usize) {
        self.pending_send_failures.store(count, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> Option<SentMessage> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(ChatId, MessageId, String)> {
        self.edits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> ChannelResult<MessageId> {
        let one_off = self
            .pending_send_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if one_off || self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChannelError::SendFailed("send disabled".into()));
        }
        let message_id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            message_id,
            text: text.to_string(),
            markup,
        });
        Ok(message_id)
    }

    async fn delete_message(&self, _chat_id: ChatId, message_id: MessageId) -> ChannelResult<()> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.lock().unwrap().contains(&message_id) {
            return Err(ChannelError::Api {
                method: "deleteMessage",
                description: "Bad Request: message to delete not found".into(),
            });
        }
        self.deleted.lock().unwrap().push(message_id);
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> ChannelResult<()> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> ChannelResult<()> {
        self.edits
            .lock()
            .unwrap()
            .push((chat_id, message_id, text.to_string()));
        Ok(())
    }
}

/// How the scripted translator answers.
pub enum Script {
    /// Prefix the text with the target language code: `"[es] hello"`
    Echo,
    Fail,
    /// Sleep before answering
    Hang(Duration),
}

/// Translator with canned behavior that records its inputs.
pub struct ScriptedTranslator {
    script: Script,
    calls: Mutex<Vec<(String, LanguagePair)>>,
}

impl ScriptedTranslator {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, LanguagePair)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn translate(&self, text: &str, pair: LanguagePair) -> Result<String, TranslateError> {
        self.calls.lock().unwrap().push((text.to_string(), pair));
        match &self.script {
            Script::Echo => Ok(format!("[{}] {text}", pair.target())),
            Script::Fail => Err(TranslateError::Unavailable("quota exceeded".into())),
            Script::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(text.to_string())
            }
        }
    }
}
