//! Inline button payloads.
//!
//! Every button the bot renders carries one [`CallbackData`] value encoded as
//! a short colon-separated string. Telegram caps payloads at 64 bytes, so
//! the encoding only holds ids and small numbers; everything else is
//! re-read from the store when the button is pressed.

use serde::Serialize;

use crate::order::{HandshakeDecision, OrderStatus};
use crate::types::{ChatId, DbId};

/// Platform limit on callback payload size.
pub const MAX_CALLBACK_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Permission {
    Admin,
    Manager,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallbackData {
    // ---- dish cards ----
    AddDish { dish_id: DbId },
    ChangeDish { dish_id: DbId },
    QuantityPage { dish_id: DbId, cursor: u32 },
    SelectQuantity { dish_id: DbId, quantity: u32 },
    CancelDish { dish_id: DbId },
    KeepCart,
    EmptyCart,

    // ---- cart review ----
    TuneLine { dish_id: DbId, quantity: u32 },
    ConfirmLine { dish_id: DbId, quantity: u32 },

    // ---- staff ----
    OrderDecision { order_id: DbId, decision: HandshakeDecision },
    ShowStatuses { order_id: DbId },
    SetStatus { order_id: DbId, status: OrderStatus },
    TogglePermission { user_id: ChatId, permission: Permission },
    ToggleRestaurant { restaurant_id: DbId },
    EditSchedule { restaurant_id: DbId },
    CancelScheduleEdit,
    ToggleDish { dish_id: DbId },
}

impl CallbackData {
    pub fn encode(&self) -> String {
        match self {
            CallbackData::AddDish { dish_id } => format!("add:{dish_id}"),
            CallbackData::ChangeDish { dish_id } => format!("chg:{dish_id}"),
            CallbackData::QuantityPage { dish_id, cursor } => format!("qpg:{dish_id}:{cursor}"),
            CallbackData::SelectQuantity { dish_id, quantity } => {
                format!("qty:{dish_id}:{quantity}")
            }
            CallbackData::CancelDish { dish_id } => format!("cnl:{dish_id}"),
            CallbackData::KeepCart => "keep".to_string(),
            CallbackData::EmptyCart => "empty".to_string(),
            CallbackData::TuneLine { dish_id, quantity } => format!("tune:{dish_id}:{quantity}"),
            CallbackData::ConfirmLine { dish_id, quantity } => format!("ok:{dish_id}:{quantity}"),
            CallbackData::OrderDecision { order_id, decision } => {
                let code = match decision {
                    HandshakeDecision::Confirm => 'c',
                    HandshakeDecision::Cancel => 'x',
                };
                format!("hs:{order_id}:{code}")
            }
            CallbackData::ShowStatuses { order_id } => format!("sts:{order_id}"),
            CallbackData::SetStatus { order_id, status } => {
                format!("set:{order_id}:{}", status.id())
            }
            CallbackData::TogglePermission {
                user_id,
                permission,
            } => {
                let code = match permission {
                    Permission::Admin => 'a',
                    Permission::Manager => 'm',
                };
                format!("perm:{user_id}:{code}")
            }
            CallbackData::ToggleRestaurant { restaurant_id } => format!("rst:{restaurant_id}"),
            CallbackData::EditSchedule { restaurant_id } => format!("sch:{restaurant_id}"),
            CallbackData::CancelScheduleEdit => "schx".to_string(),
            CallbackData::ToggleDish { dish_id } => format!("dsh:{dish_id}"),
        }
    }

    /// `None` for anything this build did not produce.
    pub fn decode(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':');
        let tag = parts.next()?;
        let args: Vec<&str> = parts.collect();

        let data = match (tag, args.as_slice()) {
            ("add", [id]) => CallbackData::AddDish {
                dish_id: id.parse().ok()?,
            },
            ("chg", [id]) => CallbackData::ChangeDish {
                dish_id: id.parse().ok()?,
            },
            ("qpg", [id, cursor]) => CallbackData::QuantityPage {
                dish_id: id.parse().ok()?,
                cursor: cursor.parse().ok()?,
            },
            ("qty", [id, q]) => CallbackData::SelectQuantity {
                dish_id: id.parse().ok()?,
                quantity: q.parse().ok()?,
            },
            ("cnl", [id]) => CallbackData::CancelDish {
                dish_id: id.parse().ok()?,
            },
            ("keep", []) => CallbackData::KeepCart,
            ("empty", []) => CallbackData::EmptyCart,
            ("tune", [id, q]) => CallbackData::TuneLine {
                dish_id: id.parse().ok()?,
                quantity: q.parse().ok()?,
            },
            ("ok", [id, q]) => CallbackData::ConfirmLine {
                dish_id: id.parse().ok()?,
                quantity: q.parse().ok()?,
            },
            ("hs", [id, code]) => CallbackData::OrderDecision {
                order_id: id.parse().ok()?,
                decision: match *code {
                    "c" => HandshakeDecision::Confirm,
                    "x" => HandshakeDecision::Cancel,
                    _ => return None,
                },
            },
            ("sts", [id]) => CallbackData::ShowStatuses {
                order_id: id.parse().ok()?,
            },
            ("set", [id, status]) => CallbackData::SetStatus {
                order_id: id.parse().ok()?,
                status: OrderStatus::from_id(status.parse().ok()?)?,
            },
            ("perm", [id, code]) => CallbackData::TogglePermission {
                user_id: id.parse().ok()?,
                permission: match *code {
                    "a" => Permission::Admin,
                    "m" => Permission::Manager,
                    _ => return None,
                },
            },
            ("rst", [id]) => CallbackData::ToggleRestaurant {
                restaurant_id: id.parse().ok()?,
            },
            ("sch", [id]) => CallbackData::EditSchedule {
                restaurant_id: id.parse().ok()?,
            },
            ("schx", []) => CallbackData::CancelScheduleEdit,
            ("dsh", [id]) => CallbackData::ToggleDish {
                dish_id: id.parse().ok()?,
            },
            _ => return None,
        };
        Some(data)
    }

    /// Staff-console buttons are handled regardless of the dialog state.
    pub fn is_staff_action(&self) -> bool {
        matches!(
            self,
            CallbackData::OrderDecision { .. }
                | CallbackData::ShowStatuses { .. }
                | CallbackData::SetStatus { .. }
                | CallbackData::TogglePermission { .. }
                | CallbackData::ToggleRestaurant { .. }
                | CallbackData::EditSchedule { .. }
                | CallbackData::CancelScheduleEdit
                | CallbackData::ToggleDish { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn widest() -> Vec<CallbackData> {
        let id = i64::MAX;
        vec![
            CallbackData::QuantityPage {
                dish_id: id,
                cursor: u32::MAX,
            },
            CallbackData::ConfirmLine {
                dish_id: id,
                quantity: u32::MAX,
            },
            CallbackData::TogglePermission {
                user_id: i64::MIN,
                permission: Permission::Manager,
            },
            CallbackData::SetStatus {
                order_id: id,
                status: OrderStatus::Cancelled,
            },
        ]
    }

    #[test]
    fn payloads_fit_platform_limit() {
        for data in widest() {
            assert!(data.encode().len() <= MAX_CALLBACK_LEN, "{data:?}");
        }
    }

    #[test]
    fn decode_reads_back_encoded_values() {
        let cases = [
            CallbackData::AddDish { dish_id: 7 },
            CallbackData::SelectQuantity {
                dish_id: 7,
                quantity: 12,
            },
            CallbackData::KeepCart,
            CallbackData::OrderDecision {
                order_id: 3,
                decision: HandshakeDecision::Cancel,
            },
            CallbackData::CancelScheduleEdit,
        ];
        for data in cases {
            assert_eq!(CallbackData::decode(&data.encode()), Some(data));
        }
    }

    #[test]
    fn unknown_or_malformed_payloads_decode_to_none() {
        assert_eq!(CallbackData::decode(""), None);
        assert_eq!(CallbackData::decode("add"), None);
        assert_eq!(CallbackData::decode("add:x"), None);
        assert_eq!(CallbackData::decode("add:1:2"), None);
        assert_eq!(CallbackData::decode("hs:1:z"), None);
        assert_eq!(CallbackData::decode("set:1:9"), None);
        assert_eq!(CallbackData::decode("{'value': '-ADD-'}"), None);
    }

    #[test]
    fn staff_actions_are_flagged() {
        assert!(CallbackData::ToggleDish { dish_id: 1 }.is_staff_action());
        assert!(!CallbackData::EmptyCart.is_staff_action());
    }
}
