//! Depletion forecaster.
//!
//! # Responsibility
//! - Turn one item's `HistorySummary` into zero or one `Prediction`.
//! - Own the lead-time suppression rule and the confidence heuristic.
//!
//! # Invariants
//! - Unchecked items never produce a prediction.
//! - Nothing is emitted while `now < predicted - lead_time`.
//! - Confidence is capped by `ForecastPolicy::confidence_cap`.

use crate::model::note::{ChecklistItem, ItemId};
use crate::prediction::summary::HistorySummary;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Default warning window before predicted depletion.
pub const DEFAULT_LEAD_TIME_MS: i64 = 12 * HOUR_MS;

/// Forecast tuning knobs. `Default` is the production policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPolicy {
    /// How long before predicted depletion a warning becomes actionable.
    pub lead_time_ms: i64,
    /// Confidence for zero samples; one sample adds one `confidence_step`.
    pub confidence_base: f64,
    pub confidence_step: f64,
    pub confidence_cap: f64,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        Self {
            lead_time_ms: DEFAULT_LEAD_TIME_MS,
            confidence_base: 0.30,
            confidence_step: 0.15,
            confidence_cap: 0.95,
        }
    }
}

/// Rejected forecast policy values.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyValidationError {
    NegativeLeadTime(i64),
    NegativeConfidenceTerm { field: &'static str, value: f64 },
    CapOutOfRange(f64),
}

impl Display for PolicyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeLeadTime(value) => {
                write!(f, "lead_time_ms must be >= 0, got {value}")
            }
            Self::NegativeConfidenceTerm { field, value } => {
                write!(f, "{field} must be >= 0, got {value}")
            }
            Self::CapOutOfRange(value) => {
                write!(f, "confidence_cap must be within [0, 1], got {value}")
            }
        }
    }
}

impl Error for PolicyValidationError {}

impl ForecastPolicy {
    /// Checks that the policy keeps confidence inside `[0, 1]`.
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.lead_time_ms < 0 {
            return Err(PolicyValidationError::NegativeLeadTime(self.lead_time_ms));
        }
        for (field, value) in [
            ("confidence_base", self.confidence_base),
            ("confidence_step", self.confidence_step),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(PolicyValidationError::NegativeConfidenceTerm { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.confidence_cap) {
            return Err(PolicyValidationError::CapOutOfRange(self.confidence_cap));
        }
        Ok(())
    }

    /// `min(cap, base + step * samples)`.
    pub fn confidence_for_samples(&self, sample_count: u32) -> f64 {
        let raw = self.confidence_base + self.confidence_step * f64::from(sample_count);
        raw.min(self.confidence_cap)
    }
}

/// Confidence under the default policy.
pub fn confidence_for_samples(sample_count: u32) -> f64 {
    ForecastPolicy::default().confidence_for_samples(sample_count)
}

/// Predicted depletion for one checklist item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub item_id: ItemId,
    pub item_text: String,
    /// Unix epoch milliseconds.
    pub predicted_out_of_stock_at: i64,
    /// Heuristic evidence score in `[0, 1]`.
    pub confidence: f64,
    pub rationale: String,
}

/// Why an item produced no prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Unchecked,
    NoHistory,
    InsufficientSamples,
    TooEarly,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::NoHistory => "no_history",
            Self::InsufficientSamples => "insufficient_samples",
            Self::TooEarly => "too_early",
        }
    }
}

/// Forecasts one item, or explains why not.
///
/// `NoHistory` is reported by the caller that fetched the events; this
/// function only sees the summary.
pub fn evaluate_item(
    item: &ChecklistItem,
    summary: &HistorySummary,
    now_ms: i64,
    policy: &ForecastPolicy,
) -> Result<Prediction, SkipReason> {
    if !item.checked {
        return Err(SkipReason::Unchecked);
    }
    let last_checked_at = match summary.last_checked_at {
        Some(at) if summary.is_usable() => at,
        _ => return Err(SkipReason::InsufficientSamples),
    };

    let predicted = last_checked_at.saturating_add(summary.average_cycle_ms);
    let warn_at = predicted.saturating_sub(policy.lead_time_ms);
    if now_ms < warn_at {
        return Err(SkipReason::TooEarly);
    }

    Ok(Prediction {
        item_id: item.id,
        item_text: item.text.clone(),
        predicted_out_of_stock_at: predicted,
        confidence: policy.confidence_for_samples(summary.sample_count),
        rationale: rationale(summary),
    })
}

/// Forecasts one item; `None` covers every "cannot predict yet" case.
pub fn forecast_item(
    item: &ChecklistItem,
    summary: &HistorySummary,
    now_ms: i64,
    policy: &ForecastPolicy,
) -> Option<Prediction> {
    evaluate_item(item, summary, now_ms, policy).ok()
}

fn rationale(summary: &HistorySummary) -> String {
    format!(
        "Based on {} restock cycles; average depletion in {} hours",
        summary.sample_count,
        summary.average_cycle_ms / HOUR_MS
    )
}
