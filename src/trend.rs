//! Trend labels and the narrative trend output shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Above this a score is strongly positive.
pub const STRONGLY_POSITIVE_ABOVE: f64 = 1.5;
/// Above this a score is positive.
pub const POSITIVE_ABOVE: f64 = 0.5;
/// At or above this a score is stable.
pub const STABLE_FROM: f64 = -0.5;
/// At or above this a score is negative; below is strongly negative.
pub const NEGATIVE_FROM: f64 = -1.5;

/// Five-level narrative direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendLabel {
    #[serde(rename = "Strongly Positive")]
    StronglyPositive,
    Positive,
    Stable,
    Negative,
    #[serde(rename = "Strongly Negative")]
    StronglyNegative,
}

impl TrendLabel {
    /// First match wins, checked from the top down.
    pub fn from_score(score: f64) -> Self {
        if score > STRONGLY_POSITIVE_ABOVE {
            TrendLabel::StronglyPositive
        } else if score > POSITIVE_ABOVE {
            TrendLabel::Positive
        } else if score >= STABLE_FROM {
            TrendLabel::Stable
        } else if score >= NEGATIVE_FROM {
            TrendLabel::Negative
        } else {
            TrendLabel::StronglyNegative
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrendLabel::StronglyPositive => "Strongly Positive",
            TrendLabel::Positive => "Positive",
            TrendLabel::Stable => "Stable",
            TrendLabel::Negative => "Negative",
            TrendLabel::StronglyNegative => "Strongly Negative",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final narrative trend judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub short_trend: f64,
    pub long_trend: f64,
    pub short_label: TrendLabel,
    pub long_label: TrendLabel,
    /// Linked scenarios that had at least one event.
    pub scenario_count: usize,
    pub fulfilled_conditions: usize,
}

impl TrendResult {
    pub fn new(short_trend: f64, long_trend: f64, scenario_count: usize, fulfilled: usize) -> Self {
        Self {
            short_trend,
            long_trend,
            short_label: TrendLabel::from_score(short_trend),
            long_label: TrendLabel::from_score(long_trend),
            scenario_count,
            fulfilled_conditions: fulfilled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_boundaries() {
        assert_eq!(TrendLabel::from_score(1.5), TrendLabel::Positive);
        assert_eq!(TrendLabel::from_score(1.5000001), TrendLabel::StronglyPositive);
        assert_eq!(TrendLabel::from_score(0.5), TrendLabel::Stable);
        assert_eq!(TrendLabel::from_score(0.5000001), TrendLabel::Positive);
        assert_eq!(TrendLabel::from_score(-0.5), TrendLabel::Stable);
        assert_eq!(TrendLabel::from_score(-0.5000001), TrendLabel::Negative);
        assert_eq!(TrendLabel::from_score(-1.5), TrendLabel::Negative);
        assert_eq!(TrendLabel::from_score(-1.5000001), TrendLabel::StronglyNegative);
        assert_eq!(TrendLabel::from_score(0.0), TrendLabel::Stable);
    }

    #[test]
    fn labels_serialize_with_spaces() {
        let r = TrendResult::new(2.0, -2.0, 1, 0);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["short_label"], serde_json::json!("Strongly Positive"));
        assert_eq!(v["long_label"], serde_json::json!("Strongly Negative"));
        assert_eq!(TrendLabel::Stable.to_string(), "Stable");
    }
}
