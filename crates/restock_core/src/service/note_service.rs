//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/update/get/list/delete APIs.
//! - Assign ids to new checklist items and stamp timestamps from the clock.
//! - Toggle checklist items, which is the only writer of toggle history.
//!
//! # Invariants
//! - `update_note` replaces the checklist only when the draft carries one.
//! - Every toggle appends exactly one event, stamped with `Clock::now_ms()`.
//! - Deleting a note keeps its toggle history.

use crate::model::note::{
    materialize_checklist, ChecklistItem, ItemId, Note, NoteDraft, NoteId, NoteValidationError,
};
use crate::prediction::clock::{Clock, SystemClock};
use crate::repo::note_repo::NoteRepository;
use crate::repo::{RepoError, RepoResult};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Draft violates checklist invariants.
    Validation(NoteValidationError),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Target checklist item does not exist in the note.
    ItemNotFound { note_id: NoteId, item_id: ItemId },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(note_id) => write!(f, "note not found: {note_id}"),
            Self::ItemNotFound { note_id, item_id } => {
                write!(f, "checklist item {item_id} not found in note {note_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(note_id) => Self::NoteNotFound(note_id),
            RepoError::ItemNotFound { note_id, item_id } => Self::ItemNotFound { note_id, item_id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: NoteRepository> NoteService<R, SystemClock> {
    /// Creates a service using the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: NoteRepository, C: Clock> NoteService<R, C> {
    /// Creates a service with an explicit clock.
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates one note, assigning ids to items that lack one.
    pub fn create_note(&mut self, draft: NoteDraft) -> Result<Note, NoteServiceError> {
        let now_ms = self.clock.now_ms();
        let checklist = draft
            .checklist
            .as_deref()
            .map(materialize_checklist)
            .unwrap_or_default();
        let note = Note {
            id: Uuid::new_v4(),
            title: draft.title,
            checklist,
            created_at: now_ms,
            updated_at: now_ms,
        };
        debug!(
            "event=note_create module=service items={}",
            note.checklist.len()
        );

        let note_id = self.repo.create_note(&note)?;
        info!("event=note_create module=service status=ok note_id={note_id}");
        self.repo
            .get_note(note_id)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))
    }

    /// Gets one note by stable ID.
    pub fn get_note(&self, note_id: NoteId) -> RepoResult<Option<Note>> {
        self.repo.get_note(note_id)
    }

    /// Lists notes, most recently updated first.
    pub fn list_notes(&self) -> RepoResult<Vec<Note>> {
        self.repo.list_notes()
    }

    /// Replaces the title and, when present, the checklist of one note.
    pub fn update_note(
        &mut self,
        note_id: NoteId,
        draft: NoteDraft,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self
            .repo
            .get_note(note_id)?
            .ok_or(NoteServiceError::NoteNotFound(note_id))?;

        note.title = draft.title;
        if let Some(items) = draft.checklist.as_deref() {
            debug!(
                "event=note_update module=service note_id={} items={}",
                note_id,
                items.len()
            );
            note.checklist = materialize_checklist(items);
        }
        note.updated_at = self.clock.now_ms();

        self.repo.replace_note(&note)?;
        info!("event=note_update module=service status=ok note_id={note_id}");
        self.repo
            .get_note(note_id)?
            .ok_or(NoteServiceError::InconsistentState(
                "updated note not found in read-back",
            ))
    }

    /// Deletes one note. Returns `false` when it did not exist.
    pub fn delete_note(&mut self, note_id: NoteId) -> RepoResult<bool> {
        let deleted = self.repo.delete_note(note_id)?;
        info!("event=note_delete module=service note_id={note_id} deleted={deleted}");
        Ok(deleted)
    }

    /// Flips one checklist item and records the toggle in history.
    pub fn toggle_checklist_item(
        &mut self,
        note_id: NoteId,
        item_id: ItemId,
    ) -> Result<ChecklistItem, NoteServiceError> {
        let at_ms = self.clock.now_ms();
        Ok(self.repo.toggle_item(note_id, item_id, at_ms)?)
    }
}
