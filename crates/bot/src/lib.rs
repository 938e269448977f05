//! The ordering bot: dialog engine, order workflow, staff console,
//! notification routing and the session dispatcher that ties them to a
//! [`Transport`](dinebot_core::transport::Transport).

pub mod config;
pub mod context;
pub mod dialog;
pub mod dispatcher;
pub mod effects;
pub mod error;
pub mod maintenance;
pub mod notifications;
pub mod router;
pub mod routes;
pub mod session;
pub mod staff;
pub mod state;
pub mod workflow;
