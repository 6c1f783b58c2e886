//! Consumption-cycle prediction engine.
//!
//! # Responsibility
//! - Summarize per-item toggle history into consumption cycles.
//! - Forecast depletion for checked items and decide whether to surface it.
//!
//! # Invariants
//! - The engine performs no I/O besides reading the injected event log.
//! - Time is read only through the injected `Clock`.
//!
//! Flow: `ToggleEventLog` -> `summarize_history` -> `forecast_item` ->
//! predictions sorted by depletion instant.

pub mod clock;
pub mod engine;
pub mod forecast;
pub mod summary;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{assemble_predictions, PredictionService};
pub use forecast::{
    confidence_for_samples, evaluate_item, forecast_item, ForecastPolicy, PolicyValidationError,
    Prediction, SkipReason, DEFAULT_LEAD_TIME_MS,
};
pub use summary::{summarize_history, HistorySummary};
