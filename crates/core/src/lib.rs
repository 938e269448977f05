//! Domain core of the ordering bot.
//!
//! Holds everything that does not touch the network or the database:
//! catalog and order models, the cart engine, the quantity paginator, the
//! availability gate, button payload encoding, report tables, and the
//! capability traits ([`repository::Repository`], [`transport::Transport`])
//! that the outer crates implement.

pub mod availability;
pub mod callback;
pub mod cart;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod inbound;
pub mod memory;
pub mod order;
pub mod paginator;
pub mod report;
pub mod repository;
pub mod text;
pub mod transport;
pub mod types;
