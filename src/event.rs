//! Input record shared by every calculator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One analyst linkage of an event to a scenario assessment.
///
/// `weight` is signed, within `[-12.0, 12.0]` and never zero; the range is
/// enforced by the caller's validation and rechecked only as a magnitude by
/// [`crate::category::categorize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEvent {
    pub event_code: String,
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
}

impl WeightedEvent {
    pub fn new(event_code: impl Into<String>, weight: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_code: event_code.into(),
            weight,
            timestamp,
        }
    }

    /// `+1.0` for positive weights, `-1.0` otherwise.
    pub fn sign(&self) -> f64 {
        sign_of(self.weight)
    }
}

pub(crate) fn sign_of(weight: f64) -> f64 {
    if weight > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Round to `dp` decimal places, ties to even.
pub(crate) fn round_dp(x: f64, dp: i32) -> f64 {
    let f = 10f64.powi(dp);
    (x * f).round_ties_even() / f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_symmetric() {
        assert_eq!(round_dp(0.00145, 4), -round_dp(-0.00145, 4));
        assert_eq!(round_dp(16.0049, 2), 16.0);
        assert_eq!(round_dp(0.12345678, 6), 0.123457);
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round_dp(0.125, 2), 0.12);
        assert_eq!(round_dp(0.375, 2), 0.38);
        assert_eq!(round_dp(-0.125, 2), -0.12);
        assert_eq!(round_dp(2.5, 0), 2.0);
    }

    #[test]
    fn sign_follows_weight() {
        let t = Utc::now();
        assert_eq!(WeightedEvent::new("a", 3.0, t).sign(), 1.0);
        assert_eq!(WeightedEvent::new("a", -3.0, t).sign(), -1.0);
    }
}
