//! Best-effort deletion of a session's recorded messages.

use crate::message::{ChatId, MessageId};
use crate::traits::Transport;
use babel_common::util::sanitize_for_log;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EraseReport {
    pub attempted: usize,
    pub deleted: usize,
    /// Ids the transport refused to delete
    pub failed: Vec<MessageId>,
}

/// Deletes recorded message ids one by one.
///
/// A failed deletion (already gone, too old, no rights) is logged and skipped;
/// the sweep always visits every id.
pub struct HistoryEraser<'a> {
    transport: &'a dyn Transport,
}

impl<'a> HistoryEraser<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Delete every id in `history` and leave it empty.
    pub async fn erase(&self, chat_id: ChatId, history: &mut Vec<MessageId>) -> EraseReport {
        let ids = std::mem::take(history);
        let mut report = EraseReport {
            attempted: ids.len(),
            ..EraseReport::default()
        };

        for message_id in ids {
            match self.transport.delete_message(chat_id, message_id).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    tracing::warn!(
                        chat_id = %chat_id,
                        message_id = %message_id,
                        error = %sanitize_for_log(&e.to_string()),
                        "Failed to delete message"
                    );
                    report.failed.push(message_id);
                }
            }
        }

        report
    }
}
