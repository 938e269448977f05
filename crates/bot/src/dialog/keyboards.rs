//! Keyboards of the client dialog.

use dinebot_core::callback::CallbackData;
use dinebot_core::cart::{Cart, CartLine, MAX_QUANTITY};
use dinebot_core::paginator;
use dinebot_core::text::{
    ABOUT_US, ADD_TO_CART, BACK_TO_MENU, BACK_TO_RESTAURANT, CANCEL_DISH, CART,
    CHOOSE_RESTAURANT, CONFIRM_QUANTITY, EMPTY_THE_CART, LEAVE_THE_CART, MY_ORDERS, PLACE_ORDER,
};
use dinebot_core::transport::{InlineButton, InlineKeyboard, Keyboard};
use dinebot_core::types::DbId;

// ---------------------------------------------------------------------------
// Reply keyboards
// ---------------------------------------------------------------------------

pub fn lobby() -> Keyboard {
    Keyboard::reply(vec![
        vec![CHOOSE_RESTAURANT],
        vec![CART, PLACE_ORDER],
        vec![ABOUT_US],
        vec![MY_ORDERS],
    ])
}

/// Restaurant names two per row, then the navigation rows.
pub fn restaurants(names: &[String]) -> Keyboard {
    let mut rows = pairs(names);
    rows.push(vec![PLACE_ORDER.to_string()]);
    rows.push(vec![BACK_TO_MENU.to_string(), CART.to_string()]);
    reply_rows(rows)
}

/// Category names two per row, then the navigation rows.
pub fn categories(names: &[String]) -> Keyboard {
    let mut rows = pairs(names);
    rows.push(vec![PLACE_ORDER.to_string()]);
    rows.push(vec![BACK_TO_RESTAURANT.to_string(), CART.to_string()]);
    rows.push(vec![BACK_TO_MENU.to_string()]);
    reply_rows(rows)
}

pub fn cart_navigation() -> Keyboard {
    Keyboard::reply(vec![vec![EMPTY_THE_CART], vec![BACK_TO_MENU, PLACE_ORDER]])
}

pub fn back_to_menu() -> Keyboard {
    Keyboard::reply(vec![vec![BACK_TO_MENU]])
}

/// Order numbers three per row under the back button.
pub fn order_numbers(ids: &[DbId]) -> Keyboard {
    let mut rows = vec![vec![BACK_TO_MENU.to_string()]];
    rows.extend(
        ids.chunks(3)
            .map(|chunk| chunk.iter().map(ToString::to_string).collect()),
    );
    reply_rows(rows)
}

// ---------------------------------------------------------------------------
// Dish cards
// ---------------------------------------------------------------------------

pub fn add_dish(dish_id: DbId) -> InlineKeyboard {
    InlineKeyboard::single(InlineButton::callback(
        ADD_TO_CART,
        CallbackData::AddDish { dish_id },
    ))
}

/// Shown on a card whose dish is already in the cart.
pub fn selected_dish(line: &CartLine, currency: &str) -> InlineKeyboard {
    InlineKeyboard::single(InlineButton::callback(
        format!("✅ {} (x{}) {currency}", line.subtotal(), line.quantity),
        CallbackData::ChangeDish {
            dish_id: line.dish_id,
        },
    ))
}

/// Card keyboard reflecting the cart: change button if the dish is in it.
pub fn dish_card(cart: &Cart, dish_id: DbId, currency: &str) -> InlineKeyboard {
    match cart.line(dish_id) {
        Some(line) => selected_dish(line, currency),
        None => add_dish(dish_id),
    }
}

/// Quantity options in rows of three, page arrows, then the cancel button.
pub fn quantity_picker(dish_id: DbId, cursor: u32) -> InlineKeyboard {
    let window = paginator::window(cursor);
    let options: Vec<u32> = window.options().collect();

    let mut rows: Vec<Vec<InlineButton>> = options
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .map(|&quantity| {
                    InlineButton::callback(
                        quantity.to_string(),
                        CallbackData::SelectQuantity { dish_id, quantity },
                    )
                })
                .collect()
        })
        .collect();

    let mut arrows = Vec::new();
    if window.has_prev {
        arrows.push(InlineButton::callback(
            "<<",
            CallbackData::QuantityPage {
                dish_id,
                cursor: paginator::prev(cursor),
            },
        ));
    }
    if window.has_next {
        arrows.push(InlineButton::callback(
            ">>",
            CallbackData::QuantityPage {
                dish_id,
                cursor: paginator::next(cursor),
            },
        ));
    }
    if !arrows.is_empty() {
        rows.push(arrows);
    }

    rows.push(vec![InlineButton::callback(
        CANCEL_DISH,
        CallbackData::CancelDish { dish_id },
    )]);
    InlineKeyboard::new(rows)
}

pub fn restaurant_switch() -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![InlineButton::callback(LEAVE_THE_CART, CallbackData::KeepCart)],
        vec![InlineButton::callback(EMPTY_THE_CART, CallbackData::EmptyCart)],
    ])
}

// ---------------------------------------------------------------------------
// Cart review
// ---------------------------------------------------------------------------

pub fn cart_lines(cart: &Cart) -> InlineKeyboard {
    InlineKeyboard::new(
        cart.lines()
            .map(|line| {
                vec![InlineButton::callback(
                    line.dish_name.clone(),
                    CallbackData::TuneLine {
                        dish_id: line.dish_id,
                        quantity: line.quantity,
                    },
                )]
            })
            .collect(),
    )
}

/// `-` / `+` around the pending quantity and an `OK` to apply it.
pub fn tune_line(dish_id: DbId, quantity: u32) -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![
            InlineButton::callback(
                "-",
                CallbackData::TuneLine {
                    dish_id,
                    quantity: quantity.saturating_sub(1),
                },
            ),
            InlineButton::callback(
                "+",
                CallbackData::TuneLine {
                    dish_id,
                    quantity: (quantity + 1).min(MAX_QUANTITY),
                },
            ),
        ],
        vec![InlineButton::callback(
            CONFIRM_QUANTITY,
            CallbackData::ConfirmLine { dish_id, quantity },
        )],
    ])
}

// ---- private helpers ----

fn pairs(names: &[String]) -> Vec<Vec<String>> {
    names.chunks(2).map(<[String]>::to_vec).collect()
}

fn reply_rows(rows: Vec<Vec<String>>) -> Keyboard {
    Keyboard::Reply { rows, resize: true }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_picker_page_has_only_next_arrow() {
        let picker = quantity_picker(4, paginator::FIRST_CURSOR);
        let data: Vec<_> = picker.callbacks().cloned().collect();

        assert_eq!(
            data.first(),
            Some(&CallbackData::SelectQuantity {
                dish_id: 4,
                quantity: 1
            })
        );
        assert!(data.iter().any(|d| matches!(d, CallbackData::QuantityPage { .. })));
        assert_eq!(data.last(), Some(&CallbackData::CancelDish { dish_id: 4 }));
        assert_eq!(picker.rows.len(), 4);
    }

    #[test]
    fn last_picker_page_ends_at_max_quantity() {
        let picker = quantity_picker(4, paginator::LAST_CURSOR);
        let quantities: Vec<u32> = picker
            .callbacks()
            .filter_map(|d| match d {
                CallbackData::SelectQuantity { quantity, .. } => Some(*quantity),
                _ => None,
            })
            .collect();
        assert_eq!(quantities.last(), Some(&MAX_QUANTITY));
    }

    #[test]
    fn tune_buttons_stay_in_range() {
        let low: Vec<_> = tune_line(1, 0).callbacks().cloned().collect();
        assert_eq!(low[0], CallbackData::TuneLine { dish_id: 1, quantity: 0 });

        let high: Vec<_> = tune_line(1, MAX_QUANTITY).callbacks().cloned().collect();
        assert_eq!(
            high[1],
            CallbackData::TuneLine {
                dish_id: 1,
                quantity: MAX_QUANTITY
            }
        );
    }

    #[test]
    fn order_numbers_go_three_per_row() {
        let Keyboard::Reply { rows, .. } = order_numbers(&[1, 2, 3, 4]) else {
            panic!("expected reply keyboard");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["1", "2", "3"]);
        assert_eq!(rows[2], vec!["4"]);
    }
}
