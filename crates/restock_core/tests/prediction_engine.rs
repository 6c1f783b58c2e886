use restock_core::db::open_db_in_memory;
use restock_core::prediction::{confidence_for_samples, summarize_history, PolicyValidationError};
use restock_core::{
    ChecklistItem, ChecklistItemDraft, FixedClock, ForecastPolicy, InMemoryToggleEventLog, Note,
    NoteDraft, NoteService, PredictionService, SqliteNoteRepository, SqliteToggleEventRepository,
    ToggleEvent, ToggleEventLog,
};
use uuid::Uuid;

const HOUR: i64 = 60 * 60 * 1000;
const DAY: i64 = 24 * HOUR;

fn note_with(items: Vec<ChecklistItem>) -> Note {
    Note {
        id: Uuid::new_v4(),
        title: "pantry".to_string(),
        checklist: items,
        created_at: 0,
        updated_at: 0,
    }
}

fn item(text: &str, checked: bool) -> ChecklistItem {
    ChecklistItem {
        id: Uuid::new_v4(),
        text: text.to_string(),
        checked,
    }
}

/// Check at `start`, restock after `cycle`, then check again at `last_check`.
fn one_cycle_then_check(
    note_id: Uuid,
    item_id: Uuid,
    start: i64,
    cycle: i64,
    last_check: i64,
) -> Vec<ToggleEvent> {
    vec![
        ToggleEvent::checked(note_id, item_id, start),
        ToggleEvent::unchecked(note_id, item_id, start + cycle),
        ToggleEvent::checked(note_id, item_id, last_check),
    ]
}

#[test]
fn item_without_history_is_excluded() {
    let note = note_with(vec![item("flour", true)]);
    let log = InMemoryToggleEventLog::new();
    let service = PredictionService::with_clock(&log, FixedClock::new(100 * DAY));

    assert!(service.predict_items_needed(&note).unwrap().is_empty());
}

#[test]
fn empty_checklist_yields_empty_list() {
    let log = InMemoryToggleEventLog::new();
    let service = PredictionService::with_clock(&log, FixedClock::new(0));

    assert!(service.predict_items_needed(&note_with(Vec::new())).unwrap().is_empty());
}

#[test]
fn only_checked_events_are_excluded() {
    let milk = item("milk", true);
    let note = note_with(vec![milk.clone()]);
    let log = InMemoryToggleEventLog::from_events([
        ToggleEvent::checked(note.id, milk.id, 0),
        ToggleEvent::checked(note.id, milk.id, DAY),
    ]);
    let service = PredictionService::with_clock(&log, FixedClock::new(100 * DAY));

    assert!(service.predict_items_needed(&note).unwrap().is_empty());
}

#[test]
fn zero_duration_cycle_is_excluded() {
    let milk = item("milk", true);
    let note = note_with(vec![milk.clone()]);
    let log = InMemoryToggleEventLog::from_events([
        ToggleEvent::checked(note.id, milk.id, DAY),
        ToggleEvent::unchecked(note.id, milk.id, DAY),
        ToggleEvent::checked(note.id, milk.id, 2 * DAY),
    ]);
    let service = PredictionService::with_clock(&log, FixedClock::new(100 * DAY));

    assert!(service.predict_items_needed(&note).unwrap().is_empty());
}

#[test]
fn two_cycles_predict_from_three_hour_average() {
    let coffee = item("coffee", true);
    let note = note_with(vec![coffee.clone()]);
    let t0 = 10 * DAY;
    let t1 = 20 * DAY;
    let last = 30 * DAY;
    let log = InMemoryToggleEventLog::from_events([
        ToggleEvent::checked(note.id, coffee.id, t0),
        ToggleEvent::unchecked(note.id, coffee.id, t0 + 2 * HOUR),
        ToggleEvent::checked(note.id, coffee.id, t1),
        ToggleEvent::unchecked(note.id, coffee.id, t1 + 4 * HOUR),
        ToggleEvent::checked(note.id, coffee.id, last),
    ]);
    let service = PredictionService::with_clock(&log, FixedClock::new(last));

    let predictions = service.predict_items_needed(&note).unwrap();
    assert_eq!(predictions.len(), 1);
    let prediction = &predictions[0];
    assert_eq!(prediction.item_id, coffee.id);
    assert_eq!(prediction.item_text, "coffee");
    assert_eq!(prediction.predicted_out_of_stock_at, last + 3 * HOUR);
    assert!((prediction.confidence - 0.60).abs() < 1e-9);
    assert_eq!(
        prediction.rationale,
        "Based on 2 restock cycles; average depletion in 3 hours"
    );
}

#[test]
fn lead_time_boundary_controls_emission() {
    let soap = item("soap", true);
    let note = note_with(vec![soap.clone()]);
    let last = 50 * DAY;
    let cycle = 3 * DAY;
    let log =
        InMemoryToggleEventLog::from_events(one_cycle_then_check(note.id, soap.id, 0, cycle, last));
    let warn_at = last + cycle - 12 * HOUR;
    let clock = FixedClock::new(warn_at - 1);
    let service = PredictionService::with_clock(&log, &clock);

    assert!(service.predict_items_needed(&note).unwrap().is_empty());

    clock.set(warn_at);
    let predictions = service.predict_items_needed(&note).unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].predicted_out_of_stock_at, last + cycle);

    clock.set(last + 10 * cycle);
    assert_eq!(service.predict_items_needed(&note).unwrap().len(), 1);
}

#[test]
fn confidence_grows_with_samples_and_caps() {
    assert!((confidence_for_samples(1) - 0.45).abs() < 1e-9);
    assert!((confidence_for_samples(5) - 0.95).abs() < 1e-9);
    assert!(confidence_for_samples(50) <= 0.95);

    let oil = item("oil", true);
    let note = note_with(vec![oil.clone()]);
    let mut events = Vec::new();
    for cycle in 0..8 {
        let start = cycle * 10 * DAY;
        events.push(ToggleEvent::checked(note.id, oil.id, start));
        events.push(ToggleEvent::unchecked(note.id, oil.id, start + DAY));
    }
    events.push(ToggleEvent::checked(note.id, oil.id, 100 * DAY));
    let log = InMemoryToggleEventLog::from_events(events);
    let service = PredictionService::with_clock(&log, FixedClock::new(101 * DAY));

    let predictions = service.predict_items_needed(&note).unwrap();
    assert!((predictions[0].confidence - 0.95).abs() < 1e-9);
}

#[test]
fn predictions_are_sorted_by_depletion_time() {
    let slow = item("rice", true);
    let fast = item("bread", true);
    let medium = item("eggs", true);
    let note = note_with(vec![slow.clone(), fast.clone(), medium.clone()]);
    let last = 40 * DAY;

    let mut events = Vec::new();
    events.extend(one_cycle_then_check(note.id, slow.id, 0, 20 * HOUR, last));
    events.extend(one_cycle_then_check(note.id, fast.id, 0, 2 * HOUR, last));
    events.extend(one_cycle_then_check(note.id, medium.id, 0, 8 * HOUR, last));
    let log = InMemoryToggleEventLog::from_events(events);
    // Late enough that even the 20h cycle is inside its warning window.
    let service = PredictionService::with_clock(&log, FixedClock::new(last + 10 * HOUR));

    let ids: Vec<Uuid> = service
        .predict_items_needed(&note)
        .unwrap()
        .into_iter()
        .map(|prediction| prediction.item_id)
        .collect();
    assert_eq!(ids, vec![fast.id, medium.id, slow.id]);
}

#[test]
fn unchecked_item_with_rich_history_is_excluded() {
    let tea = item("tea", false);
    let note = note_with(vec![tea.clone()]);
    let mut events = Vec::new();
    for cycle in 0..6 {
        let start = cycle * DAY;
        events.push(ToggleEvent::checked(note.id, tea.id, start));
        events.push(ToggleEvent::unchecked(note.id, tea.id, start + 6 * HOUR));
    }
    let log = InMemoryToggleEventLog::from_events(events);
    let service = PredictionService::with_clock(&log, FixedClock::new(100 * DAY));

    assert!(service.predict_items_needed(&note).unwrap().is_empty());
}

#[test]
fn history_is_scoped_to_the_note() {
    let shared_item = item("milk", true);
    let note = note_with(vec![shared_item.clone()]);
    let other_note = Uuid::new_v4();
    let log = InMemoryToggleEventLog::from_events(one_cycle_then_check(
        other_note,
        shared_item.id,
        0,
        HOUR,
        DAY,
    ));
    let service = PredictionService::with_clock(&log, FixedClock::new(DAY));

    assert!(service.predict_items_needed(&note).unwrap().is_empty());
}

#[test]
fn appended_events_are_seen_on_next_call() {
    let butter = item("butter", true);
    let note = note_with(vec![butter.clone()]);
    let log = InMemoryToggleEventLog::new();
    let clock = FixedClock::new(10 * DAY);
    let service = PredictionService::with_clock(&log, &clock);

    log.append_event(&ToggleEvent::checked(note.id, butter.id, DAY))
        .unwrap();
    assert!(service.predict_items_needed(&note).unwrap().is_empty());

    log.append_event(&ToggleEvent::unchecked(note.id, butter.id, 2 * DAY))
        .unwrap();
    log.append_event(&ToggleEvent::checked(note.id, butter.id, 9 * DAY))
        .unwrap();
    let predictions = service.predict_items_needed(&note).unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].predicted_out_of_stock_at, 10 * DAY);
}

#[test]
fn custom_policy_changes_lead_time() {
    let salt = item("salt", true);
    let note = note_with(vec![salt.clone()]);
    let log = InMemoryToggleEventLog::from_events(one_cycle_then_check(
        note.id,
        salt.id,
        0,
        10 * DAY,
        20 * DAY,
    ));
    let policy = ForecastPolicy {
        lead_time_ms: 5 * DAY,
        ..ForecastPolicy::default()
    };
    let service = PredictionService::with_clock(&log, FixedClock::new(25 * DAY))
        .with_policy(policy)
        .unwrap();

    assert_eq!(service.policy().lead_time_ms, 5 * DAY);
    assert_eq!(service.predict_items_needed(&note).unwrap().len(), 1);
}

#[test]
fn policy_with_cap_above_one_is_rejected() {
    let log = InMemoryToggleEventLog::new();
    let policy = ForecastPolicy {
        confidence_base: 0.9,
        confidence_cap: 2.0,
        ..ForecastPolicy::default()
    };

    let result = PredictionService::with_clock(&log, FixedClock::new(0)).with_policy(policy);
    assert!(matches!(result, Err(PolicyValidationError::CapOutOfRange(cap)) if cap == 2.0));
}

#[test]
fn policy_with_negative_lead_time_is_rejected() {
    let log = InMemoryToggleEventLog::new();
    let policy = ForecastPolicy {
        lead_time_ms: -HOUR,
        ..ForecastPolicy::default()
    };

    let result = PredictionService::with_clock(&log, FixedClock::new(0)).with_policy(policy);
    assert!(matches!(result, Err(PolicyValidationError::NegativeLeadTime(_))));
}

#[test]
fn prediction_serializes_with_snake_case_fields() {
    let jam = item("jam", true);
    let note = note_with(vec![jam.clone()]);
    let log = InMemoryToggleEventLog::from_events(one_cycle_then_check(
        note.id, jam.id, 0, DAY, 2 * DAY,
    ));
    let service = PredictionService::with_clock(&log, FixedClock::new(3 * DAY));

    let predictions = service.predict_items_needed(&note).unwrap();
    let value = serde_json::to_value(&predictions[0]).unwrap();
    assert_eq!(value["item_text"], "jam");
    assert_eq!(value["predicted_out_of_stock_at"], 3 * DAY);
    assert_eq!(value["item_id"], jam.id.to_string());
}

#[test]
fn toggles_recorded_through_notes_drive_sqlite_predictions() {
    let mut conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(DAY);

    let note = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut notes = NoteService::with_clock(repo, &clock);
        let note = notes
            .create_note(NoteDraft::new("kitchen").with_items(vec![
                ChecklistItemDraft::new("milk"),
                ChecklistItemDraft::new("cereal"),
            ]))
            .unwrap();
        let milk = note.checklist[0].id;
        let cereal = note.checklist[1].id;

        // milk: used up, restocked 2 days later, used up again.
        notes.toggle_checklist_item(note.id, milk).unwrap();
        clock.advance(2 * DAY);
        notes.toggle_checklist_item(note.id, milk).unwrap();
        clock.advance(DAY);
        notes.toggle_checklist_item(note.id, milk).unwrap();

        // cereal: one cycle, then restocked and still in stock.
        notes.toggle_checklist_item(note.id, cereal).unwrap();
        clock.advance(HOUR);
        notes.toggle_checklist_item(note.id, cereal).unwrap();

        notes.get_note(note.id).unwrap().unwrap()
    };
    let milk_checked_at = 4 * DAY;

    let log = SqliteToggleEventRepository::try_new(&conn).unwrap();
    assert_eq!(log.events_for_note(note.id).unwrap().len(), 5);

    clock.set(milk_checked_at + 2 * DAY - 12 * HOUR);
    let service = PredictionService::with_clock(&log, &clock);
    let predictions = service.predict_items_needed(&note).unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].item_text, "milk");
    assert_eq!(predictions[0].predicted_out_of_stock_at, milk_checked_at + 2 * DAY);
    assert!((predictions[0].confidence - 0.45).abs() < 1e-9);
}

#[test]
fn sqlite_log_keeps_insertion_order_for_equal_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let log = SqliteToggleEventRepository::try_new(&conn).unwrap();
    let note_id = Uuid::new_v4();
    let item_id = Uuid::new_v4();

    for event in [
        ToggleEvent::checked(note_id, item_id, 0),
        ToggleEvent::unchecked(note_id, item_id, HOUR),
        ToggleEvent::checked(note_id, item_id, HOUR),
    ] {
        log.append_event(&event).unwrap();
    }

    let events = log.events_for_item(note_id, item_id).unwrap();
    let states: Vec<(bool, i64)> = events
        .iter()
        .map(|event| (event.checked_state, event.timestamp_ms))
        .collect();
    assert_eq!(states, vec![(true, 0), (false, HOUR), (true, HOUR)]);

    let summary = summarize_history(&events);
    assert_eq!(summary.last_checked_at, Some(HOUR));
    assert_eq!(summary.sample_count, 1);
    assert_eq!(summary.average_cycle_ms, HOUR);
}
