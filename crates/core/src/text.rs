//! User-facing texts and keyboard labels.
//!
//! Reply-keyboard buttons send their label back as plain text, so the labels
//! here double as the inputs the dialog matches on.

// ---------------------------------------------------------------------------
// Navigation labels
// ---------------------------------------------------------------------------

pub const CHOOSE_RESTAURANT: &str = "📋 Choose restaurant";
pub const CART: &str = "🛒 Cart";
pub const PLACE_ORDER: &str = "🚘 Place an order";
pub const ABOUT_US: &str = "💬 About Us";
pub const CONTACT_MANAGER: &str = "👩‍💻 Contact Manager";
pub const MY_ORDERS: &str = "🗂 My Orders";
pub const BACK_TO_MENU: &str = "📋 Back to menu";
pub const BACK_TO_RESTAURANT: &str = "📋 Back to restaurant selection";
pub const EMPTY_THE_CART: &str = "Empty the cart";
pub const LEAVE_THE_CART: &str = "Leave the cart";

// ---------------------------------------------------------------------------
// Client messages
// ---------------------------------------------------------------------------

pub const WELCOME: &str = "Hello, this bot allows you to order food delivery.\n\
To place an order, you need to select a restaurant, dishes, their quantity and provide data on the place of delivery.\n\
After that, the operator will contact you to confirm.";
pub const INPUT_VALUE: &str = "Please, choose";
pub const MESSAGE_NOT_RECOGNIZED: &str = "Message not recognized";
pub const KEYBOARD_UNAVAILABLE: &str =
    "Sorry, this keyboard is no longer available.\nTry to access this section again";
pub const UNCAUGHT_CALLBACK: &str = "This button doesn't belong to current section";
pub const ABOUT_US_TEXT: &str = "OUR DESCRIPTION TEST MESSAGE";
pub const SELECT_QUANTITY: &str = "Select quantity";
pub const CART_IS_EMPTY: &str = "Cart is empty";
pub const CART_CHANGED: &str = "Your cart has been changed";
pub const CART_NOT_CHANGED: &str = "Your cart has not been changed";
pub const CART_ANOTHER_RESTAURANT: &str = "Your cart contains items from another restaurant\n\
To proceed with current restaurant you have to empty it";
pub const SELECT_DISH_TO_CHANGE: &str = "Select an item to change the quantity";
pub const ORDER_COMPLETION: &str = "Thank you for your order\nManager will contact you soon";
pub const ORDER_NUMBER: &str = "Your order number";
pub const CURRENT_ORDERS: &str = "Your current orders";
pub const PAST_ORDERS: &str = "Your previous orders";
pub const NO_ORDERS: &str = "You do not have any current or previous orders";
pub const TOTAL_PRICE: &str = "Total price";
pub const ENTER_ORDER: &str = "To view single order in details, send it's number";
pub const ORDER_CONFIRMATION: &str =
    "If cart is correct, send delivery location (Attachment -> Location) to finish your order";
pub const ORDER_NOT_FOUND: &str = "Order has not been found";
pub const RESTAURANT_CLOSED: &str = "Sorry, the restaurant is closed.";
pub const IRRELEVANT_ITEMS: &str =
    "Sorry, your cart contains irrelevant items. Please, empty your cart and fill again.";
pub const DISH_UNAVAILABLE: &str = "Sorry, this dish is no longer available";
pub const USER_NOT_FOUND: &str = "User has not been found";
pub const COME_AGAIN: &str = "To start again type /start";
pub const CANCEL_DISH: &str = "Cancel dish";

/// Sent by `/help`; `{city}` is filled in by [`help_user`].
const HELP_USER: &str = "This bot helps you order food in {city}\n\
- To start conversation, use /start\n\
- To stop, use /cancel\n\
- To show this message again, use /help\n\n\
If you have any questions, you can always contact manager in 💬 About Us";

pub const HELP_MANAGER: &str = "You are identified as manager\n\
- To view and manage order, use /order <ORDER_NUMBER>\n\
- To view last <QUANTITY> orders, use /orders <QUANTITY>\n\n\
- To view and manage user, use /user <USER_ID> or /user <@USERNAME>\n\
- To view last <QUANTITY> registered user, use /users <QUANTITY>\n\n\
- To manage existing restaurant, use /restaurant <RESTAURANT_NAME>\n\
- To add new restaurant, use /new_restaurant\n\
- To add new category, use /new_category\n\
- To add new dish, use /new_dish\n\
  (Restaurant and category must be present)\n";

pub fn help_user(city: &str) -> String {
    HELP_USER.replace("{city}", city)
}

pub fn order_placed(order_id: i64) -> String {
    format!("{ORDER_COMPLETION}\n\n{ORDER_NUMBER}: {order_id}")
}

// ---------------------------------------------------------------------------
// Staff messages
// ---------------------------------------------------------------------------

pub const NOT_MANAGER: &str = "You are not manager";
pub const NOT_ADMIN: &str = "You are not admin";
pub const CONFIRM: &str = "✅ Confirm";
pub const CANCEL: &str = "❌ Cancel";
pub const CHAT_WITH_USER: &str = "Chat with user";
pub const BOT_NOT_IN_CHAT: &str = "Bot not found in chat";
pub const ORDER_USAGE: &str = "To use this command: /order <ORDER_NUMBER>";
pub const ORDERS_USAGE: &str = "Try: /orders 10";
pub const USERS_USAGE: &str = "Try: /users 10";
pub const USER_USAGE: &str = "To use this command: /user <USER_ID> or /user <@USERNAME>";
pub const RESTAURANT_USAGE: &str = "To use this command: /restaurant <RESTAURANT_NAME>";
pub const ORDERS_EMPTY: &str = "Orders list is empty";
pub const USERS_EMPTY: &str = "Users list is empty";
pub const RESTAURANT_NOT_FOUND: &str = "Restaurant has not been found";
pub const SELF_PERMISSION: &str = "You cannot change permissions of yourself";
pub const ADMIN_REVOKED: &str = "User now cannot create new managers";
pub const ADMIN_GRANTED: &str = "User now can create new managers and has manager rights";
pub const MANAGER_REVOKED: &str = "User now has no permissions";
pub const MANAGER_GRANTED: &str =
    "User now is manager and can manage orders, restaurants and categories and dishes";
pub const RESTAURANT_SHOWN: &str = "Restaurant now can be seen to users";
pub const RESTAURANT_HIDDEN: &str = "Restaurant now cannot be seen to users";
pub const DISH_SHOWN: &str = "Dish now can be seen to users";
pub const DISH_HIDDEN: &str = "Dish now cannot be seen to users";
pub const SEND_CATEGORY: &str = "Send dish category to view dishes";
pub const CHANGE_SCHEDULE: &str = "Change schedule";
pub const SCHEDULE_CANCELLED: &str = "Schedule change has been cancelled";
pub const SCHEDULE_CHANGED: &str = "Changes has been made. Update restaurant to view changes";
pub const RESTAURANT_EXISTS: &str = "Restaurant under this name already exists";
pub const CATEGORY_EXISTS: &str = "Dish Category under this name already exists";
pub const PRICE_HINT: &str = "Try: XX.XX or XX";
pub const NO: &str = "No";
pub const STAFF_CANCELLED: &str = "Action has been cancelled";

pub fn status_button(status: &str) -> String {
    format!("Status: {status}")
}

pub fn handshake_button(confirmed: bool, status: &str) -> String {
    let mark = if confirmed { '✅' } else { '❌' };
    format!("Open user\n{mark} {status}")
}

pub fn toggle_label(enabled: bool, on: &str, off: &str) -> String {
    if enabled {
        format!("✅ {on}")
    } else {
        format!("❌ {off}")
    }
}

pub fn user_link(id: i64) -> String {
    format!("tg://user?id={id}")
}

pub fn schedule_prompt(restaurant: &str) -> String {
    format!(
        "Send new schedule for {restaurant} in single message:\n{}\n\nExample:\n1 - 09.00 - 18.00\n2 - 09.00 - 00.00\n",
        crate::availability::SCHEDULE_FORMAT
    )
}

pub fn schedule_error(err: &str) -> String {
    format!("Error: {err}\nTry: {}", crate::availability::SCHEDULE_FORMAT)
}

pub const ADD_TO_CART: &str = "Add";
pub const CONFIRM_QUANTITY: &str = "OK";
pub const CONTACT_USER: &str = "Contact user";
pub const NAME_TOO_LONG: &str = "Name is too long";
pub const CURRENCY_TOO_LONG: &str = "Currency is too long";
pub const DESCRIPTION_TOO_LONG: &str = "Description is too long";

pub const NEW_RESTAURANT: &str = "New Restaurant";
pub const NEW_CATEGORY: &str = "New Dish Category";
pub const NEW_DISH: &str = "New Dish";
pub const SEND_RESTAURANT_NAME: &str = "Send name for new restaurant";
pub const SEND_CURRENCY: &str =
    "Send restaurant currency (will be set for all dishes of this restaurant)";
pub const SEND_CATEGORY_NAME: &str = "Send name for new dish category";
pub const SEND_DISH_RESTAURANT: &str = "Send restaurant of new dish";
pub const SEND_DISH_CATEGORY: &str = "Send category of new dish";
pub const SEND_DISH_NAME: &str = "Send name for new dish";
pub const SEND_DISH_DESCRIPTION: &str = "Send description for new dish";
pub const SEND_DISH_PRICE: &str = "Send price for new dish (e.g. 12.50, 12)";
pub const SEND_DISH_PHOTO: &str =
    "To complete creation send single photo for new dish or \"No\" to leave empty";

pub fn new_schedule_hint() -> String {
    format!(
        "Send restaurant schedule in single message to complete creation:\n{}\n\nExample:\n1 - 09.00 - 18.00\n2 - 09.00 - 00.00",
        crate::availability::SCHEDULE_FORMAT
    )
}

pub fn order_status_changed(order_id: i64, status: &str) -> String {
    format!("Status of your order {order_id} has been changed: {status}")
}

pub fn notifications_skipped(count: u64) -> String {
    format!(
        "Notification router fell behind and skipped {count} order events. \
Requests for new orders may be missing, check /orders for orders awaiting a response."
    )
}

pub fn price_error(err: &str) -> String {
    format!("Error: {err}\n{PRICE_HINT}")
}

pub fn restaurant_created(name: &str) -> String {
    format!(
        "New restaurant {name} has been created successfully\n\
By default, all new restaurants are disabled and cannot be seen by users\n\n\
Please, choose next action"
    )
}

pub fn category_created(name: &str) -> String {
    format!("New dish category with name {name} has been successfully created")
}

pub fn dish_created(name: &str) -> String {
    format!("Dish {name} has been created successfully")
}

pub fn named_not_found(entity: &str, name: &str) -> String {
    format!("{entity} with name {name} has not been found")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_mentions_city_and_commands() {
        let help = help_user("Lisbon");
        assert!(help.starts_with("This bot helps you order food in Lisbon\n"));
        assert!(help.contains("/cancel"));
    }

    #[test]
    fn order_placed_ends_with_number() {
        assert!(order_placed(17).ends_with("Your order number: 17"));
    }

    #[test]
    fn handshake_button_shows_mark_and_status() {
        assert_eq!(handshake_button(true, "In Progress"), "Open user\n✅ In Progress");
        assert_eq!(handshake_button(false, "Cancelled"), "Open user\n❌ Cancelled");
    }
}
