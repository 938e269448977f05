//! Conversions between Bot API wire types and the platform-neutral types of
//! `dinebot-core`.

use dinebot_core::callback::CallbackData;
use dinebot_core::inbound::{ClientProfile, Inbound, InboundEvent};
use dinebot_core::transport::{
    ButtonAction, CallbackRef, InlineKeyboard, Keyboard, MessageKind, MessageRef,
};
use dinebot_core::types::GeoPoint;

use crate::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, Message, ReplyKeyboardMarkup,
    ReplyKeyboardRemove, ReplyMarkup, Update, User,
};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Convert an update into an inbound event.
///
/// Returns `None` for updates without a sender (channel posts, service
/// messages) since they cannot belong to a session.
pub fn inbound_from_update(update: Update) -> Option<Inbound> {
    if let Some(query) = update.callback_query {
        let message = query.message.as_ref()?;
        let chat = message.chat.id;
        let message_ref = message_ref(message);
        let data = query.data.as_deref().and_then(CallbackData::decode);
        return Some(Inbound {
            client: profile(&query.from),
            chat,
            event: InboundEvent::Callback {
                callback: CallbackRef {
                    id: query.id,
                    chat,
                },
                message: message_ref,
                data,
            },
        });
    }

    let message = update.message?;
    let client = profile(message.from.as_ref()?);
    Some(Inbound {
        client,
        chat: message.chat.id,
        event: message_event(&message),
    })
}

pub fn message_ref(message: &Message) -> MessageRef {
    MessageRef {
        chat: message.chat.id,
        message_id: message.message_id,
        kind: if message.is_media() {
            MessageKind::Media
        } else {
            MessageKind::Text
        },
    }
}

fn profile(user: &User) -> ClientProfile {
    ClientProfile {
        id: user.id,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        is_bot: user.is_bot,
    }
}

fn message_event(message: &Message) -> InboundEvent {
    if let Some(text) = message.text.as_deref() {
        return InboundEvent::from_text(text);
    }
    if let Some(location) = message.location {
        return InboundEvent::Location(GeoPoint {
            latitude: location.latitude,
            longitude: location.longitude,
        });
    }
    // Telegram sends every resolution of the photo; keep the largest.
    if let Some(photo) = message
        .photo
        .as_ref()
        .and_then(|sizes| sizes.iter().max_by_key(|p| u64::from(p.width) * u64::from(p.height)))
    {
        return InboundEvent::Photo {
            file_id: photo.file_id.clone(),
        };
    }
    InboundEvent::Unsupported
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

pub fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply { rows, resize } => ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
            keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|text| KeyboardButton { text: text.clone() })
                        .collect()
                })
                .collect(),
            resize_keyboard: *resize,
        }),
        Keyboard::Inline(inline) => ReplyMarkup::Inline(inline_markup(inline)),
        Keyboard::Remove => ReplyMarkup::Remove(ReplyKeyboardRemove {
            remove_keyboard: true,
        }),
    }
}

pub fn inline_markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| match &button.action {
                        ButtonAction::Callback(data) => InlineKeyboardButton {
                            text: button.text.clone(),
                            callback_data: Some(data.encode()),
                            url: None,
                        },
                        ButtonAction::Url(url) => InlineKeyboardButton {
                            text: button.text.clone(),
                            callback_data: None,
                            url: Some(url.clone()),
                        },
                    })
                    .collect()
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
