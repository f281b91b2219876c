//! Fixed user-facing texts and keyboards.

use crate::language::{LanguagePair, LanguageSelector};
use crate::message::{InlineButton, ReplyMarkup};

pub const GREETING: &str = "Hi! Please choose the language you want to translate into:";
pub const REPROMPT: &str = "Please choose 'Translate to Spanish' or 'Translate to English'.";
pub const APOLOGY: &str = "Sorry, something went wrong while translating. Please try again.";
pub const DELETE_PROMPT: &str = "Do you want to clear the translation history?";
pub const DELETE_BUTTON: &str = "Clear history";
pub const HISTORY_CLEARED: &str = "Translation history cleared.";

/// Callback data carried by the clear-history button.
pub const DELETE_HISTORY_CALLBACK: &str = "delete_history";

/// Confirmation after a language pair is chosen.
pub fn confirmation(pair: LanguagePair) -> String {
    format!(
        "You chose to translate into {target}. Send me text in {source} and I will translate it into {target}.",
        source = pair.source().name(),
        target = pair.target().name(),
    )
}

fn label_rows(selector: &LanguageSelector) -> Vec<Vec<String>> {
    selector.labels().map(|l| vec![l.to_string()]).collect()
}

/// Menu shown by `/start`: labels plus both commands, hidden after one use.
pub fn start_keyboard(selector: &LanguageSelector) -> ReplyMarkup {
    let mut rows = label_rows(selector);
    rows.push(vec!["/start".to_string(), "/delete".to_string()]);
    ReplyMarkup::Keyboard {
        rows,
        one_time: true,
        resize: false,
    }
}

/// Persistent keyboard while translating: labels for switching plus `/delete`.
pub fn translating_keyboard(selector: &LanguageSelector) -> ReplyMarkup {
    let mut rows = label_rows(selector);
    rows.push(vec!["/delete".to_string()]);
    ReplyMarkup::Keyboard {
        rows,
        one_time: false,
        resize: true,
    }
}

pub fn delete_keyboard() -> ReplyMarkup {
    ReplyMarkup::Inline(vec![vec![InlineButton::new(
        DELETE_BUTTON,
        DELETE_HISTORY_CALLBACK,
    )]])
}
