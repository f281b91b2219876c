//! Bot API encoding of reply keyboards.

use crate::message::ReplyMarkup;
use serde_json::{json, Value};

/// Encode a keyboard as the Bot API `reply_markup` object.
pub fn to_reply_markup(markup: &ReplyMarkup) -> Value {
    match markup {
        ReplyMarkup::Keyboard {
            rows,
            one_time,
            resize,
        } => {
            let keyboard: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().map(|text| json!({ "text": text })).collect())
                .collect();
            json!({
                "keyboard": keyboard,
                "one_time_keyboard": one_time,
                "resize_keyboard": resize,
            })
        }
        ReplyMarkup::Inline(rows) => {
            let keyboard: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|btn| {
                            json!({
                                "text": btn.text,
                                "callback_data": btn.callback_data,
                            })
                        })
                        .collect()
                })
                .collect();
            json!({ "inline_keyboard": keyboard })
        }
    }
}
