//! Consumption-cycle summarizer.
//!
//! # Responsibility
//! - Pair each "checked" event with the next "unchecked" event into one
//!   consumption sample.
//! - Reduce samples to an average cycle length and a forecast anchor.
//!
//! # Invariants
//! - Only strictly positive durations count as samples.
//! - A newer "checked" overwrites an unpaired older one.
//! - `last_checked_at` is the latest "checked" event overall, paired or not.

use crate::model::toggle::ToggleEvent;

/// Per-item history reduced for one prediction call. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySummary {
    /// Latest "checked" instant in epoch milliseconds.
    pub last_checked_at: Option<i64>,
    /// Mean consume-to-restock duration in milliseconds; zero without samples.
    pub average_cycle_ms: i64,
    pub sample_count: u32,
}

impl HistorySummary {
    /// Whether this summary carries enough evidence to forecast from.
    pub fn is_usable(&self) -> bool {
        self.last_checked_at.is_some() && self.sample_count > 0 && self.average_cycle_ms != 0
    }
}

#[derive(Default)]
struct Pairing {
    checked_since: Option<i64>,
    samples: Vec<i64>,
}

impl Pairing {
    fn step(mut self, event: &ToggleEvent) -> Self {
        if event.checked_state {
            self.checked_since = Some(event.timestamp_ms);
        } else if let Some(since) = self.checked_since.take() {
            let duration = event.timestamp_ms.saturating_sub(since);
            if duration > 0 {
                self.samples.push(duration);
            }
        }
        self
    }
}

/// Summarizes one item's toggle history.
///
/// Input order does not matter; events are stably sorted by timestamp, so
/// equal timestamps keep the order the log returned them in.
pub fn summarize_history(events: &[ToggleEvent]) -> HistorySummary {
    let mut ordered: Vec<&ToggleEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.timestamp_ms);

    let pairing = ordered
        .iter()
        .fold(Pairing::default(), |state, event| state.step(event));

    let last_checked_at = ordered
        .iter()
        .rev()
        .find(|event| event.checked_state)
        .map(|event| event.timestamp_ms);

    let sample_count = u32::try_from(pairing.samples.len()).unwrap_or(u32::MAX);
    let average_cycle_ms = if pairing.samples.is_empty() {
        0
    } else {
        let total: i128 = pairing.samples.iter().map(|&ms| i128::from(ms)).sum();
        let mean = total / pairing.samples.len() as i128;
        i64::try_from(mean).unwrap_or(i64::MAX)
    };

    HistorySummary {
        last_checked_at,
        average_cycle_ms,
        sample_count,
    }
}
