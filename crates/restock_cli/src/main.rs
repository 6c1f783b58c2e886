//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `restock_core` linkage with a deterministic probe.
//! - Print depletion predictions for one note from a database file.
//!
//! Usage:
//! - `restock_cli` prints ping and version.
//! - `restock_cli predict <db_path> <note_uuid>` prints one line per prediction.

use restock_core::db::open_db;
use restock_core::{
    NoteRepository, PredictionService, SqliteNoteRepository, SqliteToggleEventRepository,
};
use std::error::Error;
use std::process::ExitCode;
use uuid::Uuid;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            println!("restock_core ping={}", restock_core::ping());
            println!("restock_core version={}", restock_core::core_version());
            ExitCode::SUCCESS
        }
        [command, db_path, note_id] if command == "predict" => {
            match predict(db_path, note_id) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("error: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("usage: restock_cli [predict <db_path> <note_uuid>]");
            ExitCode::from(2)
        }
    }
}

fn predict(db_path: &str, note_id: &str) -> Result<(), Box<dyn Error>> {
    let note_id = Uuid::parse_str(note_id)?;
    let mut conn = open_db(db_path)?;

    let note = {
        let repo = SqliteNoteRepository::try_new(&mut conn)?;
        repo.get_note(note_id)?
            .ok_or_else(|| format!("note not found: {note_id}"))?
    };

    let events = SqliteToggleEventRepository::try_new(&conn)?;
    let predictions = PredictionService::new(events).predict_items_needed(&note)?;
    if predictions.is_empty() {
        println!("no items predicted to run out soon");
    }
    for prediction in predictions {
        println!(
            "{}\tout_at_ms={}\tconfidence={:.2}\t{}",
            prediction.item_text,
            prediction.predicted_out_of_stock_at,
            prediction.confidence,
            prediction.rationale
        );
    }
    Ok(())
}
