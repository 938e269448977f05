//! The client ordering dialog.

mod engine;
pub mod keyboards;

pub use engine::DialogEngine;

use dinebot_core::catalog::Dish;
use dinebot_core::text::{KEYBOARD_UNAVAILABLE, MESSAGE_NOT_RECOGNIZED};
use dinebot_core::transport::{CallbackRef, Content, MessageRef};
use dinebot_core::types::ChatId;

use crate::effects::Transition;

/// Reply to a button whose payload no longer makes sense: alert and strip
/// the keyboard from the message.
pub fn keyboard_unavailable(callback: &CallbackRef, message: MessageRef) -> Transition {
    Transition::stay()
        .alert(callback, KEYBOARD_UNAVAILABLE)
        .edit(message, None, None)
}

pub fn not_recognized(chat: ChatId) -> Transition {
    Transition::stay().text(chat, MESSAGE_NOT_RECOGNIZED)
}

/// Dish card: a photo with caption when the dish has one, text otherwise.
pub fn dish_content(dish: &Dish, currency: &str) -> Content {
    let caption = dish.card_text(currency);
    match &dish.photo_file_id {
        Some(file_id) => Content::Photo {
            file_id: file_id.clone(),
            caption: Some(caption),
        },
        None => Content::Text(caption),
    }
}
