//! Order lifecycle: client submission and the staff confirm/cancel
//! handshake.

mod handshake;
mod order;

pub use handshake::{Handshake, HandshakeError};
pub use order::{OrderWorkflow, SubmissionError};
