//! Order event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`OrderEvent`]: the event envelope published when an order is placed
//!   or its status changes.

pub mod bus;

pub use bus::{EventBus, OrderEvent, OrderEventKind};
