//! Toggle event log contracts and implementations.
//!
//! # Responsibility
//! - Supply per-item toggle history to the prediction engine.
//! - Keep the engine independent from how history is stored.
//!
//! # Invariants
//! - The log is append-only; no update or delete API exists.
//! - A read returns one consistent snapshot; concurrent appends may or may
//!   not be visible, never half-visible.
//! - SQLite reads order by `timestamp_ms`, then insertion order.
//! - The in-memory log returns one item's events in append order. Per-note
//!   reads sort by timestamp only, so ties between different items come back
//!   in unspecified order.

use crate::model::note::{ItemId, NoteId};
use crate::model::toggle::ToggleEvent;
use crate::repo::{bool_to_int, ensure_schema, int_to_bool, parse_uuid, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::sync::RwLock;

const EVENT_SELECT_SQL: &str = "SELECT
    note_uuid,
    item_uuid,
    item_text,
    checked_state,
    timestamp_ms
FROM toggle_events";

/// Source of recorded toggle events.
pub trait ToggleEventLog {
    /// Appends one event to the log.
    fn append_event(&self, event: &ToggleEvent) -> RepoResult<()>;
    /// Returns all events for one note item. May be empty.
    fn events_for_item(&self, note_id: NoteId, item_id: ItemId) -> RepoResult<Vec<ToggleEvent>>;
    /// Returns all events for every item of one note.
    fn events_for_note(&self, note_id: NoteId) -> RepoResult<Vec<ToggleEvent>>;
}

impl<T: ToggleEventLog + ?Sized> ToggleEventLog for &T {
    fn append_event(&self, event: &ToggleEvent) -> RepoResult<()> {
        (**self).append_event(event)
    }

    fn events_for_item(&self, note_id: NoteId, item_id: ItemId) -> RepoResult<Vec<ToggleEvent>> {
        (**self).events_for_item(note_id, item_id)
    }

    fn events_for_note(&self, note_id: NoteId) -> RepoResult<Vec<ToggleEvent>> {
        (**self).events_for_note(note_id)
    }
}

/// SQLite-backed toggle event log over the `toggle_events` table.
pub struct SqliteToggleEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteToggleEventRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "toggle_events",
            &[
                "id",
                "note_uuid",
                "item_uuid",
                "item_text",
                "checked_state",
                "timestamp_ms",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ToggleEventLog for SqliteToggleEventRepository<'_> {
    fn append_event(&self, event: &ToggleEvent) -> RepoResult<()> {
        insert_toggle_event(self.conn, event)
    }

    fn events_for_item(&self, note_id: NoteId, item_id: ItemId) -> RepoResult<Vec<ToggleEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             WHERE note_uuid = ?1 AND item_uuid = ?2
             ORDER BY timestamp_ms ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![note_id.to_string(), item_id.to_string()])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn events_for_note(&self, note_id: NoteId) -> RepoResult<Vec<ToggleEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             WHERE note_uuid = ?1
             ORDER BY timestamp_ms ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([note_id.to_string()])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }
}

/// Inserts one row into `toggle_events`.
///
/// Shared by the standalone log and the note toggle transaction; the
/// autoincrement `id` orders events that share a timestamp.
pub(crate) fn insert_toggle_event(conn: &Connection, event: &ToggleEvent) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO toggle_events (
            note_uuid,
            item_uuid,
            item_text,
            checked_state,
            timestamp_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            event.note_id.to_string(),
            event.item_id.to_string(),
            event.item_text.as_str(),
            bool_to_int(event.checked_state),
            event.timestamp_ms,
        ],
    )?;
    Ok(())
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<ToggleEvent> {
    let note_uuid: String = row.get("note_uuid")?;
    let item_uuid: String = row.get("item_uuid")?;
    Ok(ToggleEvent {
        note_id: parse_uuid(&note_uuid, "toggle_events.note_uuid")?,
        item_id: parse_uuid(&item_uuid, "toggle_events.item_uuid")?,
        item_text: row.get("item_text")?,
        checked_state: int_to_bool(row.get("checked_state")?, "toggle_events.checked_state")?,
        timestamp_ms: row.get("timestamp_ms")?,
    })
}

type ItemHistory = HashMap<ItemId, Vec<ToggleEvent>>;

/// Process-local toggle event log.
///
/// Shared across threads behind `Arc`; reads clone the item's list under the
/// read lock, so a caller never observes a half-appended list.
#[derive(Debug, Default)]
pub struct InMemoryToggleEventLog {
    history: RwLock<HashMap<NoteId, ItemHistory>>,
}

impl InMemoryToggleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log pre-filled with `events` in the given order.
    pub fn from_events(events: impl IntoIterator<Item = ToggleEvent>) -> Self {
        let mut history: HashMap<NoteId, ItemHistory> = HashMap::new();
        for event in events {
            history
                .entry(event.note_id)
                .or_default()
                .entry(event.item_id)
                .or_default()
                .push(event);
        }
        Self {
            history: RwLock::new(history),
        }
    }
}

impl ToggleEventLog for InMemoryToggleEventLog {
    fn append_event(&self, event: &ToggleEvent) -> RepoResult<()> {
        let mut history = self
            .history
            .write()
            .map_err(|_| RepoError::InvalidData("toggle event log lock poisoned".to_string()))?;
        history
            .entry(event.note_id)
            .or_default()
            .entry(event.item_id)
            .or_default()
            .push(event.clone());
        debug!(
            "event=toggle_append module=repo status=ok note_id={} item_id={}",
            event.note_id, event.item_id
        );
        Ok(())
    }

    fn events_for_item(&self, note_id: NoteId, item_id: ItemId) -> RepoResult<Vec<ToggleEvent>> {
        let history = self
            .history
            .read()
            .map_err(|_| RepoError::InvalidData("toggle event log lock poisoned".to_string()))?;
        Ok(history
            .get(&note_id)
            .and_then(|items| items.get(&item_id))
            .cloned()
            .unwrap_or_default())
    }

    fn events_for_note(&self, note_id: NoteId) -> RepoResult<Vec<ToggleEvent>> {
        let history = self
            .history
            .read()
            .map_err(|_| RepoError::InvalidData("toggle event log lock poisoned".to_string()))?;
        let mut events: Vec<ToggleEvent> = history
            .get(&note_id)
            .map(|items| items.values().flatten().cloned().collect())
            .unwrap_or_default();
        events.sort_by_key(|event| event.timestamp_ms);
        Ok(events)
    }
}
