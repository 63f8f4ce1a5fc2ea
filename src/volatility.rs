//! Volatility and velocity: direction-free activity metrics.
//!
//! Volatility sums *unsigned* magnitudes per category, so `+5` and `-5`
//! add up instead of cancelling as they do in the batch probability path.
//! Velocity is volatility per event.

use serde::{Deserialize, Serialize};

use crate::category::categorize;
use crate::error::Result;
use crate::event::{round_dp, WeightedEvent};
use crate::probability::CategoryBreakdown;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VolatilityResult {
    pub volatility_score: f64,
    pub category_breakdown: CategoryBreakdown,
    pub event_count: usize,
}

/// Category-weighted total of absolute weights.
pub fn calculate(events: &[WeightedEvent]) -> Result<VolatilityResult> {
    if events.is_empty() {
        return Ok(VolatilityResult::default());
    }

    let mut sums = [0.0f64; 4];
    for ev in events {
        let abs_weight = ev.weight.abs();
        let (category, _) = categorize(abs_weight)?;
        sums[category as usize] += abs_weight;
    }

    let (category_breakdown, score) = CategoryBreakdown::from_sums(sums);
    Ok(VolatilityResult {
        volatility_score: round_dp(score, 2),
        category_breakdown,
        event_count: events.len(),
    })
}

/// Average intensity per event; `0.0` when there are no events.
pub fn velocity(volatility_score: f64, event_count: usize) -> f64 {
    if event_count == 0 {
        return 0.0;
    }
    round_dp(volatility_score / event_count as f64, 2)
}
