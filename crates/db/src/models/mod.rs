//! Row structs.
//!
//! Each submodule holds `FromRow` structs matching database rows plus the
//! conversions into the domain types of `dinebot_core`.

pub mod catalog;
pub mod order;
pub mod user;
