//! Message types exchanged between the transport and the conversation core.

use std::fmt;

/// Chat identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// User identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Message identifier, unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bot commands the conversation understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the language menu
    Start,
    /// Offer to clear the translation history
    Delete,
    /// Anything else starting with `/`
    Other(String),
}

impl Command {
    /// Parse a command from message text.
    ///
    /// Accepts `/name`, `/name@BotName`, and trailing arguments. Returns `None`
    /// when the text is not a command at all.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let word = rest.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or("");
        if name.is_empty() {
            return None;
        }

        Some(match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "delete" => Self::Delete,
            _ => Self::Other(name.to_string()),
        })
    }
}

/// What happened in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A bot command
    Command {
        message_id: MessageId,
        command: Command,
    },
    /// Free text
    Text { message_id: MessageId, text: String },
    /// An inline button press
    Callback {
        callback_id: String,
        /// Message carrying the pressed button
        message_id: MessageId,
        data: String,
    },
}

/// Inbound event delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub kind: EventKind,
    /// Trace ID for log correlation
    pub trace_id: String,
}

impl InboundEvent {
    /// Short label for logs.
    pub fn kind_str(&self) -> &'static str {
        match self.kind {
            EventKind::Command { .. } => "command",
            EventKind::Text { .. } => "text",
            EventKind::Callback { .. } => "callback",
        }
    }
}

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMarkup {
    /// Reply keyboard replacing the user's text keyboard
    Keyboard {
        rows: Vec<Vec<String>>,
        one_time: bool,
        resize: bool,
    },
    /// Buttons attached below the message
    Inline(Vec<Vec<InlineButton>>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/start", Some(Command::Start) ; "plain start")]
    #[test_case("/start@babel_bot", Some(Command::Start) ; "addressed start")]
    #[test_case("/DELETE", Some(Command::Delete) ; "uppercase delete")]
    #[test_case("/delete now", Some(Command::Delete) ; "with argument")]
    #[test_case("/help", Some(Command::Other("help".into())) ; "unknown")]
    #[test_case("hello", None ; "not a command")]
    #[test_case("/", None ; "bare slash")]
    fn parses_commands(text: &str, expected: Option<Command>) {
        assert_eq!(Command::parse(text), expected);
    }

    #[test]
    fn ids_display_as_numbers() {
        assert_eq!(ChatId(-100).to_string(), "-100");
        assert_eq!(MessageId(7).to_string(), "7");
    }
}
