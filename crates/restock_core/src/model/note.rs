//! Note and checklist domain model.
//!
//! # Responsibility
//! - Define the canonical shopping-list note shape shared by repo/service.
//! - Normalize and validate checklist input before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - Item ids are unique within one note.
//! - Item text is never blank after whitespace normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Stable identifier for a checklist item.
///
/// Item ids are globally unique, so toggle history keyed by
/// `(NoteId, ItemId)` never collides across notes.
pub type ItemId = Uuid;

/// One line of a shopping-list checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    pub text: String,
    /// `true` means consumed/used up; `false` means in stock.
    pub checked: bool,
}

/// Canonical note record with its ordered checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Display order is the vector order.
    pub checklist: Vec<ChecklistItem>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Bumped on every edit or toggle.
    pub updated_at: i64,
}

/// Checklist item input for create/update use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemDraft {
    /// Existing id to keep; `None` asks the service to assign one.
    pub id: Option<ItemId>,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

impl ChecklistItemDraft {
    /// Creates an unchecked draft without an id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            checked: false,
        }
    }

    /// Marks this draft as already checked.
    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }
}

/// Note input for create/update use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    /// `None` on update keeps the stored checklist untouched.
    pub checklist: Option<Vec<ChecklistItemDraft>>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            checklist: None,
        }
    }

    /// Attaches a checklist to this draft.
    pub fn with_items(mut self, items: Vec<ChecklistItemDraft>) -> Self {
        self.checklist = Some(items);
        self
    }
}

/// Validation errors for note write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Checklist item text is empty after normalization.
    BlankItemText { position: usize },
    /// Same item id appears twice in one checklist.
    DuplicateItemId(ItemId),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankItemText { position } => {
                write!(f, "checklist item at position {position} has blank text")
            }
            Self::DuplicateItemId(id) => write!(f, "duplicate checklist item id: {id}"),
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Validates checklist invariants before persistence.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        let mut seen = HashSet::with_capacity(self.checklist.len());
        for (position, item) in self.checklist.iter().enumerate() {
            if item.text.trim().is_empty() {
                return Err(NoteValidationError::BlankItemText { position });
            }
            if !seen.insert(item.id) {
                return Err(NoteValidationError::DuplicateItemId(item.id));
            }
        }
        Ok(())
    }

    /// Finds one checklist item by id.
    pub fn item(&self, item_id: ItemId) -> Option<&ChecklistItem> {
        self.checklist.iter().find(|item| item.id == item_id)
    }
}

/// Builds a checklist from drafts, assigning fresh ids where missing.
pub fn materialize_checklist(drafts: &[ChecklistItemDraft]) -> Vec<ChecklistItem> {
    drafts
        .iter()
        .map(|draft| ChecklistItem {
            id: draft.id.unwrap_or_else(Uuid::new_v4),
            text: normalize_item_text(draft.text.as_str()),
            checked: draft.checked,
        })
        .collect()
}

/// Collapses whitespace runs to one space and trims both ends.
pub fn normalize_item_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}
