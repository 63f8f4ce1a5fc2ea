//! # Probability Calculator
//! Converts event weights into signed probability adjustments.
//!
//! Two paths with different basis-point conversions:
//! - immediate: one event, ×4 (single signals move estimates less)
//! - batch: a window of events, ×10, summing signed magnitudes per category
//!   *before* applying the category multiplier
//!
//! Neither path clamps; the caller adds the adjustment to its previous
//! probability and clamps the sum to `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::category::{categorize, WeightCategory};
use crate::error::{Result, ScoringError};
use crate::event::{round_dp, sign_of, WeightedEvent};

/// Basis-point factor for a single event.
pub const CONVERSION_IMMEDIATE: f64 = 4.0;
/// Basis-point factor for windowed batches.
pub const CONVERSION_BATCH: f64 = 10.0;
/// Basis points per unit of probability.
pub const BASIS_POINTS_PER_UNIT: f64 = 10_000.0;

/// Batch window label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowType {
    #[default]
    #[serde(rename = "1day")]
    OneDay,
    #[serde(rename = "7day")]
    SevenDay,
    #[serde(rename = "30day")]
    ThirtyDay,
}

impl WindowType {
    pub fn as_str(self) -> &'static str {
        match self {
            WindowType::OneDay => "1day",
            WindowType::SevenDay => "7day",
            WindowType::ThirtyDay => "30day",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowType {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1day" => Ok(WindowType::OneDay),
            "7day" => Ok(WindowType::SevenDay),
            "30day" => Ok(WindowType::ThirtyDay),
            other => Err(ScoringError::invalid(format!(
                "unknown window_type: {other}"
            ))),
        }
    }
}

/// Result of the single-event path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub probability_adjustment: f64,
    pub basis_points: f64,
    pub adjusted_weight: f64,
    pub category: WeightCategory,
    pub multiplier: u32,
}

/// Pre- and post-multiplier sum for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySum {
    pub sum: f64,
    pub modified: f64,
}

/// Per-category sums, kept for auditability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub minor: CategorySum,
    pub moderate: CategorySum,
    pub major: CategorySum,
    pub critical: CategorySum,
}

impl CategoryBreakdown {
    pub fn get(&self, category: WeightCategory) -> &CategorySum {
        match category {
            WeightCategory::Minor => &self.minor,
            WeightCategory::Moderate => &self.moderate,
            WeightCategory::Major => &self.major,
            WeightCategory::Critical => &self.critical,
        }
    }

    fn get_mut(&mut self, category: WeightCategory) -> &mut CategorySum {
        match category {
            WeightCategory::Minor => &mut self.minor,
            WeightCategory::Moderate => &mut self.moderate,
            WeightCategory::Major => &mut self.major,
            WeightCategory::Critical => &mut self.critical,
        }
    }

    /// Build a breakdown from raw per-category sums: applies the multipliers
    /// and returns the breakdown (rounded to 2 dp) with the unrounded total.
    pub(crate) fn from_sums(sums: [f64; 4]) -> (Self, f64) {
        let mut out = Self::default();
        let mut total = 0.0;
        for (category, raw) in WeightCategory::ALL.into_iter().zip(sums) {
            let modified = raw * category.multiplier() as f64;
            total += modified;
            *out.get_mut(category) = CategorySum {
                sum: round_dp(raw, 2),
                modified: round_dp(modified, 2),
            };
        }
        (out, total)
    }
}

/// Result of the windowed path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub probability_adjustment: f64,
    pub basis_points: f64,
    pub adjusted_weight: f64,
    pub category_breakdown: CategoryBreakdown,
    pub event_count: usize,
    pub window_type: WindowType,
}

impl BatchResult {
    pub fn empty(window_type: WindowType) -> Self {
        Self {
            probability_adjustment: 0.0,
            basis_points: 0.0,
            adjusted_weight: 0.0,
            category_breakdown: CategoryBreakdown::default(),
            event_count: 0,
            window_type,
        }
    }
}

/// Probability adjustment from a single signed weight (×4 conversion).
pub fn calculate_immediate(weight: f64) -> Result<CalculationResult> {
    let abs_weight = weight.abs();
    let (category, multiplier) = categorize(abs_weight)?;

    let adjusted_weight = abs_weight * multiplier as f64 * sign_of(weight);
    let basis_points = adjusted_weight * CONVERSION_IMMEDIATE;
    let probability_adjustment = basis_points / BASIS_POINTS_PER_UNIT;

    Ok(CalculationResult {
        probability_adjustment: round_dp(probability_adjustment, 6),
        basis_points: round_dp(basis_points, 2),
        adjusted_weight: round_dp(adjusted_weight, 2),
        category,
        multiplier,
    })
}

/// Probability adjustment from a batch of events (×10 conversion).
///
/// Events are categorized by magnitude but their *signed* value is summed per
/// category, so `+6.0` and `-6.0` in the same band cancel before the
/// multiplier is applied. An empty batch yields an all-zero result.
pub fn calculate_batch(events: &[WeightedEvent], window_type: WindowType) -> Result<BatchResult> {
    if events.is_empty() {
        return Ok(BatchResult::empty(window_type));
    }

    let mut sums = [0.0f64; 4];
    for ev in events {
        let abs_weight = ev.weight.abs();
        let (category, _) = categorize(abs_weight)?;
        sums[category as usize] += abs_weight * ev.sign();
    }

    let (category_breakdown, adjusted_weight) = CategoryBreakdown::from_sums(sums);
    let basis_points = adjusted_weight * CONVERSION_BATCH;
    let probability_adjustment = basis_points / BASIS_POINTS_PER_UNIT;

    debug!(
        target: "scoring",
        window = %window_type,
        events = events.len(),
        adjusted_weight,
        "batch probability"
    );

    Ok(BatchResult {
        probability_adjustment: round_dp(probability_adjustment, 6),
        basis_points: round_dp(basis_points, 2),
        adjusted_weight: round_dp(adjusted_weight, 2),
        category_breakdown,
        event_count: events.len(),
        window_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ev(code: &str, w: f64) -> WeightedEvent {
        WeightedEvent::new(code, w, Utc::now())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn immediate_minor_weight() {
        let r = calculate_immediate(3.5).unwrap();
        assert_eq!(r.category, WeightCategory::Minor);
        assert_eq!(r.multiplier, 1);
        assert!(approx(r.adjusted_weight, 3.5));
        assert!(approx(r.basis_points, 14.0));
        assert!(approx(r.probability_adjustment, 0.0014));
    }

    #[test]
    fn immediate_major_weight() {
        let r = calculate_immediate(9.0).unwrap();
        assert_eq!(r.category, WeightCategory::Major);
        assert_eq!(r.multiplier, 8);
        assert!(approx(r.adjusted_weight, 72.0));
        assert!(approx(r.basis_points, 288.0));
        assert!(approx(r.probability_adjustment, 0.0288));
    }

    #[test]
    fn immediate_preserves_sign() {
        let pos = calculate_immediate(11.5).unwrap();
        let neg = calculate_immediate(-11.5).unwrap();
        assert_eq!(neg.probability_adjustment, -pos.probability_adjustment);
        assert_eq!(neg.adjusted_weight, -pos.adjusted_weight);
        assert_eq!(neg.category, WeightCategory::Critical);
    }

    #[test]
    fn immediate_rejects_zero_and_out_of_range() {
        assert!(matches!(
            calculate_immediate(0.0),
            Err(ScoringError::OutOfRange { .. })
        ));
        assert!(matches!(
            calculate_immediate(-12.5),
            Err(ScoringError::OutOfRange { .. })
        ));
    }

    #[test]
    fn batch_sums_signed_per_category() {
        let r = calculate_batch(&[ev("a", 6.0), ev("b", -2.0)], WindowType::OneDay).unwrap();
        assert!(approx(r.category_breakdown.moderate.sum, 6.0));
        assert!(approx(r.category_breakdown.moderate.modified, 18.0));
        assert!(approx(r.category_breakdown.minor.sum, -2.0));
        assert!(approx(r.category_breakdown.minor.modified, -2.0));
        assert!(approx(r.adjusted_weight, 16.0));
        assert!(approx(r.basis_points, 160.0));
        assert!(approx(r.probability_adjustment, 0.016));
        assert_eq!(r.event_count, 2);
    }

    #[test]
    fn batch_opposite_weights_cancel_within_band() {
        let r = calculate_batch(&[ev("a", 5.0), ev("b", -5.0)], WindowType::SevenDay).unwrap();
        assert_eq!(r.adjusted_weight, 0.0);
        assert_eq!(r.probability_adjustment, 0.0);
        assert_eq!(r.event_count, 2);
        assert_eq!(r.window_type, WindowType::SevenDay);
    }

    #[test]
    fn empty_batch_is_all_zero() {
        let r = calculate_batch(&[], WindowType::ThirtyDay).unwrap();
        assert_eq!(r, BatchResult::empty(WindowType::ThirtyDay));
        assert_eq!(r.event_count, 0);
        assert_eq!(r.category_breakdown, CategoryBreakdown::default());
    }

    #[test]
    fn batch_propagates_out_of_range() {
        let err = calculate_batch(&[ev("a", 3.0), ev("b", 13.0)], WindowType::OneDay);
        assert!(matches!(err, Err(ScoringError::OutOfRange { .. })));
    }

    #[test]
    fn immediate_is_dampened_to_forty_percent_of_batch() {
        for w in [0.3, 3.5, 6.2, 9.9, 12.0] {
            let single = calculate_immediate(w).unwrap().probability_adjustment;
            let batch = calculate_batch(&[ev("a", w)], WindowType::OneDay)
                .unwrap()
                .probability_adjustment;
            assert!(single.abs() < batch.abs());
            assert!((single / batch - 0.4).abs() < 1e-3, "w={w}");
        }
    }

    #[test]
    fn window_type_parses_known_labels_only() {
        assert_eq!("1day".parse::<WindowType>().unwrap(), WindowType::OneDay);
        assert_eq!("30day".parse::<WindowType>().unwrap(), WindowType::ThirtyDay);
        assert!(matches!(
            "90day".parse::<WindowType>(),
            Err(ScoringError::InvalidArgument(_))
        ));
    }
}
