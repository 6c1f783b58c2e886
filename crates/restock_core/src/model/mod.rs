//! Domain model for shopping-list notes and their toggle history.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the toggle event shape independent from any storage backend.
//!
//! # Invariants
//! - Every note and checklist item is identified by a stable UUID.
//! - Toggle events are append-only.

pub mod note;
pub mod toggle;
