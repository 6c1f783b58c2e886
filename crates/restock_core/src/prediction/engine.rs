//! Prediction assembly over a whole note.
//!
//! # Responsibility
//! - Fetch history for each checked item and forecast it.
//! - Return survivors ordered by predicted depletion, soonest first.
//!
//! # Invariants
//! - Computation is synchronous and holds no locks of its own.
//! - "Cannot predict" is never an error; only event-log reads can fail.
//! - Nothing is cached between calls.

use crate::model::note::{ChecklistItem, Note};
use crate::model::toggle::ToggleEvent;
use crate::prediction::clock::{Clock, SystemClock};
use crate::prediction::forecast::{
    evaluate_item, ForecastPolicy, PolicyValidationError, Prediction, SkipReason,
};
use crate::prediction::summary::summarize_history;
use crate::repo::event_repo::ToggleEventLog;
use crate::repo::RepoResult;
use log::{debug, info};
use std::time::Instant;

/// Forecasts every checked item of `checklist` at `now_ms`.
///
/// `history` is asked only for checked items. Output is stably sorted by
/// `predicted_out_of_stock_at`, so ties keep checklist order.
pub fn assemble_predictions<F>(
    checklist: &[ChecklistItem],
    now_ms: i64,
    policy: &ForecastPolicy,
    mut history: F,
) -> RepoResult<Vec<Prediction>>
where
    F: FnMut(&ChecklistItem) -> RepoResult<Vec<ToggleEvent>>,
{
    let mut predictions = Vec::new();
    for item in checklist {
        match predict_one(item, now_ms, policy, &mut history)? {
            Ok(prediction) => predictions.push(prediction),
            Err(reason) => debug!(
                "event=prediction_skip module=prediction item_id={} reason={}",
                item.id,
                reason.as_str()
            ),
        }
    }
    predictions.sort_by_key(|prediction| prediction.predicted_out_of_stock_at);
    Ok(predictions)
}

fn predict_one<F>(
    item: &ChecklistItem,
    now_ms: i64,
    policy: &ForecastPolicy,
    history: &mut F,
) -> RepoResult<Result<Prediction, SkipReason>>
where
    F: FnMut(&ChecklistItem) -> RepoResult<Vec<ToggleEvent>>,
{
    if !item.checked {
        return Ok(Err(SkipReason::Unchecked));
    }
    let events = history(item)?;
    if events.is_empty() {
        return Ok(Err(SkipReason::NoHistory));
    }
    let summary = summarize_history(&events);
    Ok(evaluate_item(item, &summary, now_ms, policy))
}

/// Consumption-cycle prediction service.
///
/// Generic over the event log and the clock so tests can feed literal
/// histories and pin "now".
pub struct PredictionService<E: ToggleEventLog, C: Clock = SystemClock> {
    events: E,
    clock: C,
    policy: ForecastPolicy,
}

impl<E: ToggleEventLog> PredictionService<E, SystemClock> {
    /// Creates a service reading the wall clock with the default policy.
    pub fn new(events: E) -> Self {
        Self::with_clock(events, SystemClock)
    }
}

impl<E: ToggleEventLog, C: Clock> PredictionService<E, C> {
    /// Creates a service with an explicit clock and the default policy.
    pub fn with_clock(events: E, clock: C) -> Self {
        Self {
            events,
            clock,
            policy: ForecastPolicy::default(),
        }
    }

    /// Replaces the forecast policy.
    ///
    /// # Errors
    /// - Returns the validation error when `policy` could emit a confidence
    ///   outside `[0, 1]` or a negative lead time.
    pub fn with_policy(mut self, policy: ForecastPolicy) -> Result<Self, PolicyValidationError> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    pub fn policy(&self) -> &ForecastPolicy {
        &self.policy
    }

    /// Predicts which checked items of `note` are about to run out.
    ///
    /// # Errors
    /// - Returns the event log's error unchanged when a history read fails.
    pub fn predict_items_needed(&self, note: &Note) -> RepoResult<Vec<Prediction>> {
        let started_at = Instant::now();
        let now_ms = self.clock.now_ms();
        let predictions = assemble_predictions(&note.checklist, now_ms, &self.policy, |item| {
            self.events.events_for_item(note.id, item.id)
        })?;

        info!(
            "event=prediction_run module=prediction status=ok note_id={} items={} emitted={} duration_ms={}",
            note.id,
            note.checklist.len(),
            predictions.len(),
            started_at.elapsed().as_millis()
        );
        Ok(predictions)
    }
}
