//! Domain model for boards, attributes and shared content.
//!
//! # Responsibility
//! - Define the records services and repositories exchange.
//! - Replace entity inheritance with shared records embedded by value plus
//!   closed family tags.
//!
//! # Invariants
//! - Every persisted record is identified by a positive `i64` id.
//! - Timestamps are Unix epoch milliseconds.

pub mod attribute;
pub mod board;
pub mod class;
pub mod content;
pub mod setting;
pub mod user;
