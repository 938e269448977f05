//! Order notification routing.
//!
//! The [`NotificationRouter`] subscribes to the event bus. New orders go to
//! the staff chat as a confirm/cancel request, falling back to the
//! developer chat when the staff chat cannot be reached. Status changes are
//! reported to the client who placed the order.

pub mod router;

pub use router::{request_keyboard, NotificationRouter};
