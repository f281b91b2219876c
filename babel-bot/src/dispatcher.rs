//! Event dispatcher: one serial worker per session.

use crate::conversation::Conversation;
use crate::message::InboundEvent;
use crate::session::SessionKey;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long a session worker waits for its next event before exiting.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

type Workers = Arc<DashMap<SessionKey, mpsc::UnboundedSender<InboundEvent>>>;

/// Fans inbound events out to per-session workers.
///
/// Events for one (chat, user) pair are handled strictly in arrival order;
/// different sessions proceed concurrently. Workers exit after
/// [`DEFAULT_IDLE_TIMEOUT`] without events and are started again on the next
/// one; session state itself stays in the [`SessionStore`](crate::SessionStore).
pub struct Dispatcher {
    conversation: Arc<Conversation>,
    workers: Workers,
    idle_timeout: Duration,
}

impl Dispatcher {
    pub fn new(conversation: Arc<Conversation>) -> Self {
        Self {
            conversation,
            workers: Arc::new(DashMap::new()),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Route one event to its session's worker, starting the worker if needed.
    pub fn dispatch(&self, event: InboundEvent) {
        let key = SessionKey::new(event.chat_id, event.user_id);
        let mut worker = self
            .workers
            .entry(key)
            .or_insert_with(|| self.spawn_worker(key));

        // A worker only goes away early if it panicked; replace it and resend.
        if let Err(mpsc::error::SendError(event)) = worker.send(event) {
            tracing::debug!(chat_id = %key.chat_id, user_id = %key.user_id, "Session worker gone, restarting");
            let replacement = self.spawn_worker(key);
            let _ = replacement.send(event);
            *worker = replacement;
        }
    }

    fn spawn_worker(&self, key: SessionKey) -> mpsc::UnboundedSender<InboundEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
        let conversation = self.conversation.clone();
        let workers = self.workers.clone();
        let idle_timeout = self.idle_timeout;

        tokio::spawn(async move {
            tracing::debug!(chat_id = %key.chat_id, user_id = %key.user_id, "Session worker started");
            loop {
                match tokio::time::timeout(idle_timeout, rx.recv()).await {
                    Ok(Some(event)) => {
                        conversation.handle(event).await;
                    }
                    Ok(None) => return,
                    Err(_) => {
                        // Decided under the entry's lock, so no dispatch can slip
                        // an event in between the check and the close.
                        let mut idle = false;
                        workers.remove_if(&key, |_, _| {
                            idle = rx.is_empty();
                            if idle {
                                rx.close();
                            }
                            idle
                        });
                        if idle {
                            tracing::debug!(chat_id = %key.chat_id, user_id = %key.user_id, "Session worker idle, stopped");
                            return;
                        }
                    }
                }
            }
        });

        tx
    }

    /// Number of live session workers.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Drain `rx` until it closes.
    pub fn spawn(self: Arc<Self>, mut rx: mpsc::Receiver<InboundEvent>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Dispatcher started");

            while let Some(event) = rx.recv().await {
                self.dispatch(event);
            }

            // Dropping the senders lets workers finish queued events and exit.
            self.workers.clear();
            tracing::info!("Dispatcher stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ChatId, EventKind, MessageId, UserId};
    use crate::session::SessionStore;
    use crate::testing::{RecordingTransport, Script, ScriptedTranslator};

    fn text(chat: i64, user: i64, id: i64, text: &str) -> InboundEvent {
        InboundEvent {
            chat_id: ChatId(chat),
            user_id: UserId(user),
            username: None,
            kind: EventKind::Text {
                message_id: MessageId(id),
                text: text.into(),
            },
            trace_id: format!("t-{id}"),
        }
    }

    async fn wait_for_sent(transport: &RecordingTransport, count: usize) {
        for _ in 0..200 {
            if transport.sent().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} messages, got {}", transport.sent().len());
    }

    #[tokio::test]
    async fn events_for_one_session_keep_order() {
        let transport = Arc::new(RecordingTransport::new());
        let translator = Arc::new(ScriptedTranslator::new(Script::Echo));
        let conversation = Arc::new(Conversation::new(
            Arc::new(SessionStore::new()),
            transport.clone(),
            translator.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(conversation.clone()));

        let (tx, rx) = mpsc::channel(16);
        let handle = dispatcher.clone().spawn(rx);

        tx.send(text(1, 1, 1, "Translate to Spanish")).await.unwrap();
        for (id, word) in [(2, "one"), (3, "two"), (4, "three")] {
            tx.send(text(1, 1, id, word)).await.unwrap();
        }
        tx.send(text(2, 2, 10, "Translate to English")).await.unwrap();

        wait_for_sent(&transport, 5).await;

        let words: Vec<String> = translator.calls().into_iter().map(|(t, _)| t).collect();
        assert_eq!(words, vec!["one", "two", "three"]);
        assert_eq!(dispatcher.worker_count(), 2);

        let session = conversation
            .sessions()
            .get(&SessionKey::new(ChatId(1), UserId(1)))
            .unwrap();
        let history = session.lock().await.history().to_vec();
        assert_eq!(history.len(), 6);
        assert_eq!(history[0], MessageId(2));
        assert_eq!(history[2], MessageId(3));
        assert_eq!(history[4], MessageId(4));

        drop(tx);
        handle.await.unwrap();
        assert_eq!(dispatcher.worker_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_workers_are_reaped_and_restarted() {
        let transport = Arc::new(RecordingTransport::new());
        let translator = Arc::new(ScriptedTranslator::new(Script::Echo));
        let conversation = Arc::new(Conversation::new(
            Arc::new(SessionStore::new()),
            transport.clone(),
            translator.clone(),
        ));
        let dispatcher =
            Arc::new(Dispatcher::new(conversation.clone()).with_idle_timeout(Duration::from_secs(60)));

        let (tx, rx) = mpsc::channel(16);
        let _handle = dispatcher.clone().spawn(rx);

        tx.send(text(1, 1, 1, "Translate to Spanish")).await.unwrap();
        wait_for_sent(&transport, 1).await;
        assert_eq!(dispatcher.worker_count(), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(dispatcher.worker_count(), 0);

        // Session state outlives the worker
        tx.send(text(1, 1, 2, "hello")).await.unwrap();
        wait_for_sent(&transport, 2).await;
        assert_eq!(transport.last_sent().unwrap().text, "[es] hello");
        assert_eq!(dispatcher.worker_count(), 1);
    }
}
