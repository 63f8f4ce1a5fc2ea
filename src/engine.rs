//! # Window Metrics
//! Pure, testable logic that maps `(events, window, reference)` → probability,
//! volatility and velocity in one shot. No I/O.
//!
//! `immediate` scores exactly one event with the single-event conversion;
//! the batch windows filter first and then run the batch calculators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::category::{categorize, WeightCategory};
use crate::error::{Result, ScoringError};
use crate::event::{round_dp, WeightedEvent};
use crate::probability::{calculate_batch, calculate_immediate, CategoryBreakdown, WindowType};
use crate::rolling;
use crate::volatility;

/// Either the single-event path or one of the batch windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WindowSpec {
    Immediate,
    Batch(WindowType),
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowSpec::Immediate => f.write_str("immediate"),
            WindowSpec::Batch(w) => f.write_str(w.as_str()),
        }
    }
}

impl FromStr for WindowSpec {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim() == "immediate" {
            return Ok(WindowSpec::Immediate);
        }
        s.parse().map(WindowSpec::Batch)
    }
}

impl TryFrom<String> for WindowSpec {
    type Error = ScoringError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<WindowSpec> for String {
    fn from(w: WindowSpec) -> String {
        w.to_string()
    }
}

/// Combined metrics for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub window_type: WindowSpec,
    pub probability_adjustment: f64,
    pub basis_points: f64,
    pub adjusted_weight: f64,
    /// Set only for `immediate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<WeightCategory>,
    /// Batch windows only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_breakdown: Option<CategoryBreakdown>,
    /// Batch windows only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility_breakdown: Option<CategoryBreakdown>,
    pub volatility_score: f64,
    pub velocity: f64,
    pub event_count: usize,
}

/// Probability, volatility and velocity for `window` at `reference`.
pub fn calculate_all_metrics(
    events: &[WeightedEvent],
    window: WindowSpec,
    reference: DateTime<Utc>,
) -> Result<WindowMetrics> {
    match window {
        WindowSpec::Immediate => {
            let [event] = events else {
                return Err(ScoringError::invalid(
                    "immediate calculation requires exactly one event",
                ));
            };
            let prob = calculate_immediate(event.weight)?;
            let abs_weight = event.weight.abs();
            let (_, multiplier) = categorize(abs_weight)?;
            // for one event velocity equals volatility
            let volatility_score = round_dp(abs_weight * multiplier as f64, 2);

            Ok(WindowMetrics {
                window_type: window,
                probability_adjustment: prob.probability_adjustment,
                basis_points: prob.basis_points,
                adjusted_weight: prob.adjusted_weight,
                category: Some(prob.category),
                category_breakdown: None,
                volatility_breakdown: None,
                volatility_score,
                velocity: volatility_score,
                event_count: 1,
            })
        }
        WindowSpec::Batch(window_type) => {
            let filtered = rolling::filter(window_type, events, reference);
            let prob = calculate_batch(&filtered, window_type)?;
            let vol = volatility::calculate(&filtered)?;
            let velocity = volatility::velocity(vol.volatility_score, vol.event_count);

            Ok(WindowMetrics {
                window_type: window,
                probability_adjustment: prob.probability_adjustment,
                basis_points: prob.basis_points,
                adjusted_weight: prob.adjusted_weight,
                category: None,
                category_breakdown: Some(prob.category_breakdown),
                volatility_breakdown: Some(vol.category_breakdown),
                volatility_score: vol.volatility_score,
                velocity,
                event_count: prob.event_count,
            })
        }
    }
}
