//! Toggle event record.
//!
//! # Invariants
//! - Events are immutable once recorded.
//! - The log is append-only; events are never edited or deleted.

use crate::model::note::{ItemId, NoteId};
use serde::{Deserialize, Serialize};

/// One user action of checking or unchecking a checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleEvent {
    pub note_id: NoteId,
    pub item_id: ItemId,
    /// Item text at toggle time. Diagnostic only; prediction ignores it.
    pub item_text: String,
    /// State the item moved *to*.
    pub checked_state: bool,
    /// Unix epoch milliseconds.
    pub timestamp_ms: i64,
}

impl ToggleEvent {
    /// Builds a "checked" event (item consumed).
    pub fn checked(note_id: NoteId, item_id: ItemId, timestamp_ms: i64) -> Self {
        Self {
            note_id,
            item_id,
            item_text: String::new(),
            checked_state: true,
            timestamp_ms,
        }
    }

    /// Builds an "unchecked" event (item restocked).
    pub fn unchecked(note_id: NoteId, item_id: ItemId, timestamp_ms: i64) -> Self {
        Self {
            checked_state: false,
            ..Self::checked(note_id, item_id, timestamp_ms)
        }
    }

    /// Sets the diagnostic item text.
    pub fn with_text(mut self, item_text: impl Into<String>) -> Self {
        self.item_text = item_text.into();
        self
    }
}
