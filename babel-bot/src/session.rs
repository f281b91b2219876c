//! Per-(chat, user) conversation state, kept in memory for the process lifetime.

use crate::language::LanguagePair;
use crate::message::{ChatId, MessageId, UserId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Identity of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl SessionKey {
    pub const fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }
}

/// Where the conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    AwaitingLanguageChoice,
    Translating,
}

/// State of one user's conversation in one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pair: Option<LanguagePair>,
    state: ConversationState,
    history: Vec<MessageId>,
    prompted: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair(&self) -> Option<LanguagePair> {
        self.pair
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Message ids recorded since the current pair was chosen, oldest first.
    pub fn history(&self) -> &[MessageId] {
        &self.history
    }

    /// Whether the language menu has been shown to this user.
    pub fn prompted(&self) -> bool {
        self.prompted
    }

    /// Set the pair, clear history, and enter `Translating`.
    pub fn choose_pair(&mut self, pair: LanguagePair) {
        self.pair = Some(pair);
        self.history.clear();
        self.state = ConversationState::Translating;
        self.prompted = true;
    }

    /// Go back to the language menu. Pair and history are kept.
    pub fn await_language_choice(&mut self) {
        self.state = ConversationState::AwaitingLanguageChoice;
        self.prompted = true;
    }

    pub fn record(&mut self, message_id: MessageId) {
        self.history.push(message_id);
    }

    pub(crate) fn history_mut(&mut self) -> &mut Vec<MessageId> {
        &mut self.history
    }
}

/// Keyed in-memory session store.
///
/// Each session sits behind its own async mutex, so a handler can hold it across
/// the translation call without blocking other sessions. Callers must lock a
/// session for the whole handling of one event; the dispatcher additionally
/// feeds each session's events one at a time, in arrival order.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionKey, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `key`, creating an empty one on first use.
    pub fn get_or_create(&self, key: SessionKey) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .value()
            .clone()
    }

    /// Get an existing session without creating one.
    pub fn get(&self, key: &SessionKey) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn key(chat: i64, user: i64) -> SessionKey {
        SessionKey::new(ChatId(chat), UserId(user))
    }

    #[test]
    fn new_session_awaits_choice() {
        let session = Session::new();
        assert_eq!(session.state(), ConversationState::AwaitingLanguageChoice);
        assert!(session.pair().is_none());
        assert!(session.history().is_empty());
        assert!(!session.prompted());
    }

    #[test]
    fn choosing_pair_resets_history() {
        let mut session = Session::new();
        session.record(MessageId(1));
        session.record(MessageId(2));

        let pair = LanguagePair::new(Language::Es, Language::En).unwrap();
        session.choose_pair(pair);

        assert_eq!(session.pair(), Some(pair));
        assert_eq!(session.state(), ConversationState::Translating);
        assert!(session.history().is_empty());
    }

    #[test]
    fn await_choice_keeps_pair_and_history() {
        let mut session = Session::new();
        session.choose_pair(LanguagePair::new(Language::En, Language::Es).unwrap());
        session.record(MessageId(9));
        session.await_language_choice();
        assert_eq!(session.state(), ConversationState::AwaitingLanguageChoice);
        assert!(session.pair().is_some());
        assert_eq!(session.history(), &[MessageId(9)]);
    }

    #[tokio::test]
    async fn store_isolates_sessions_by_key() {
        let store = SessionStore::new();
        let a = store.get_or_create(key(1, 10));
        let b = store.get_or_create(key(1, 11));

        a.lock().await.record(MessageId(5));
        assert!(b.lock().await.history().is_empty());
        assert_eq!(store.len(), 2);

        let again = store.get_or_create(key(1, 10));
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(again.lock().await.history(), &[MessageId(5)]);
    }

    #[test]
    fn get_does_not_create() {
        let store = SessionStore::new();
        assert!(store.get(&key(2, 2)).is_none());
        assert!(store.is_empty());
    }
}
