//! Core domain logic for restock: shopping-list notes and depletion forecasts.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod prediction;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::note::{
    ChecklistItem, ChecklistItemDraft, ItemId, Note, NoteDraft, NoteId, NoteValidationError,
};
pub use model::toggle::ToggleEvent;
pub use prediction::{
    summarize_history, Clock, FixedClock, ForecastPolicy, HistorySummary, Prediction,
    PredictionService, SystemClock,
};
pub use repo::event_repo::{InMemoryToggleEventLog, SqliteToggleEventRepository, ToggleEventLog};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::{RepoError, RepoResult};
pub use service::note_service::{NoteService, NoteServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
