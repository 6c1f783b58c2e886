//! Note/checklist repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide note persistence APIs over `notes` + `checklist_items`.
//! - Own the toggle write path: flip item state and append history atomically.
//!
//! # Invariants
//! - Write paths call `Note::validate()` before SQL mutations.
//! - Checklist replacement and toggles run in a single immediate transaction.
//! - Note list order is `updated_at DESC, uuid ASC`.

use crate::model::note::{ChecklistItem, ItemId, Note, NoteId};
use crate::model::toggle::ToggleEvent;
use crate::repo::event_repo::insert_toggle_event;
use crate::repo::{bool_to_int, ensure_schema, int_to_bool, parse_uuid, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    created_at,
    updated_at
FROM notes";

/// Repository interface for note CRUD and checklist toggles.
pub trait NoteRepository {
    /// Inserts one note with its full checklist.
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId>;
    /// Replaces title, checklist and `updated_at`; keeps `created_at`.
    fn replace_note(&mut self, note: &Note) -> RepoResult<()>;
    /// Gets one note by id.
    fn get_note(&self, note_id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists all notes, most recently updated first.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Deletes one note and its checklist. Returns `false` when absent.
    fn delete_note(&mut self, note_id: NoteId) -> RepoResult<bool>;
    /// Flips one item's checked state and appends a toggle event at `at_ms`.
    fn toggle_item(
        &mut self,
        note_id: NoteId,
        item_id: ItemId,
        at_ms: i64,
    ) -> RepoResult<ChecklistItem>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(conn, "notes", &["uuid", "title", "created_at", "updated_at"])?;
        ensure_schema(
            conn,
            "checklist_items",
            &["uuid", "note_uuid", "position", "text", "is_checked"],
        )?;
        ensure_schema(
            conn,
            "toggle_events",
            &["note_uuid", "item_uuid", "checked_state", "timestamp_ms"],
        )?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO notes (uuid, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                note.id.to_string(),
                note.title.as_str(),
                note.created_at,
                note.updated_at,
            ],
        )?;
        insert_items(&tx, note)?;
        tx.commit()?;

        Ok(note.id)
    }

    fn replace_note(&mut self, note: &Note) -> RepoResult<()> {
        note.validate()?;

        let note_uuid = note.id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                title = ?2,
                updated_at = ?3
             WHERE uuid = ?1;",
            params![note_uuid.as_str(), note.title.as_str(), note.updated_at],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }

        tx.execute(
            "DELETE FROM checklist_items WHERE note_uuid = ?1;",
            [note_uuid.as_str()],
        )?;
        insert_items(&tx, note)?;
        tx.commit()?;

        Ok(())
    }

    fn get_note(&self, note_id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([note_id.to_string()])?;
        if let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let checklist = load_checklist(self.conn, &uuid_text)?;
            return Ok(Some(Note {
                id: parse_uuid(&uuid_text, "notes.uuid")?,
                title: row.get("title")?,
                checklist,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            }));
        }

        Ok(None)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY updated_at DESC, uuid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let checklist = load_checklist(self.conn, &uuid_text)?;
            notes.push(Note {
                id: parse_uuid(&uuid_text, "notes.uuid")?,
                title: row.get("title")?,
                checklist,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            });
        }

        Ok(notes)
    }

    fn delete_note(&mut self, note_id: NoteId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [note_id.to_string()])?;
        Ok(changed > 0)
    }

    fn toggle_item(
        &mut self,
        note_id: NoteId,
        item_id: ItemId,
        at_ms: i64,
    ) -> RepoResult<ChecklistItem> {
        let note_uuid = note_id.to_string();
        let item_uuid = item_id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !note_exists_in_tx(&tx, note_uuid.as_str())? {
            return Err(RepoError::NotFound(note_id));
        }

        let current: Option<(String, i64)> = tx
            .query_row(
                "SELECT text, is_checked
                 FROM checklist_items
                 WHERE note_uuid = ?1 AND uuid = ?2;",
                params![note_uuid.as_str(), item_uuid.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((text, checked_raw)) = current else {
            return Err(RepoError::ItemNotFound { note_id, item_id });
        };
        let checked = !int_to_bool(checked_raw, "checklist_items.is_checked")?;

        tx.execute(
            "UPDATE checklist_items
             SET is_checked = ?3
             WHERE note_uuid = ?1 AND uuid = ?2;",
            params![note_uuid.as_str(), item_uuid.as_str(), bool_to_int(checked)],
        )?;
        let event = if checked {
            ToggleEvent::checked(note_id, item_id, at_ms)
        } else {
            ToggleEvent::unchecked(note_id, item_id, at_ms)
        };
        insert_toggle_event(&tx, &event.with_text(text.as_str()))?;
        tx.execute(
            "UPDATE notes SET updated_at = ?2 WHERE uuid = ?1;",
            params![note_uuid.as_str(), at_ms],
        )?;
        tx.commit()?;

        info!(
            "event=note_toggle module=repo status=ok note_id={} item_id={} checked={}",
            note_id, item_id, checked
        );

        Ok(ChecklistItem {
            id: item_id,
            text,
            checked,
        })
    }
}

fn insert_items(tx: &Transaction<'_>, note: &Note) -> RepoResult<()> {
    let note_uuid = note.id.to_string();
    let mut stmt = tx.prepare(
        "INSERT INTO checklist_items (uuid, note_uuid, position, text, is_checked)
         VALUES (?1, ?2, ?3, ?4, ?5);",
    )?;
    for (position, item) in note.checklist.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| RepoError::InvalidData("checklist too long".to_string()))?;
        stmt.execute(params![
            item.id.to_string(),
            note_uuid.as_str(),
            position,
            item.text.as_str(),
            bool_to_int(item.checked),
        ])?;
    }
    Ok(())
}

fn load_checklist(conn: &Connection, note_uuid: &str) -> RepoResult<Vec<ChecklistItem>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, text, is_checked
         FROM checklist_items
         WHERE note_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([note_uuid])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        items.push(ChecklistItem {
            id: parse_uuid(&uuid_text, "checklist_items.uuid")?,
            text: row.get("text")?,
            checked: int_to_bool(row.get("is_checked")?, "checklist_items.is_checked")?,
        });
    }
    Ok(items)
}

fn note_exists_in_tx(tx: &Transaction<'_>, note_uuid: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE uuid = ?1);",
        [note_uuid],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
