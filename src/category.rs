//! # Weight Categories
//! Four severity bands over the absolute weight, each with a fixed multiplier.
//!
//! | band     | \|weight\|    | multiplier |
//! |----------|-------------|------------|
//! | minor    | 0.1 – 4.9   | ×1         |
//! | moderate | 5.0 – 7.9   | ×3         |
//! | major    | 8.0 – 10.9  | ×8         |
//! | critical | 11.0 – 12.0 | ×20        |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScoringError};

/// Smallest accepted magnitude.
pub const MIN_WEIGHT: f64 = 0.1;
/// Largest accepted magnitude.
pub const MAX_WEIGHT: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightCategory {
    Minor,
    Moderate,
    Major,
    Critical,
}

/// One row of the band table: `[lower, upper]` inclusive as listed.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub category: WeightCategory,
    pub lower: f64,
    pub upper: f64,
    pub multiplier: u32,
}

/// Ascending, contiguous band table.
pub const BANDS: [Band; 4] = [
    Band {
        category: WeightCategory::Minor,
        lower: 0.1,
        upper: 4.9,
        multiplier: 1,
    },
    Band {
        category: WeightCategory::Moderate,
        lower: 5.0,
        upper: 7.9,
        multiplier: 3,
    },
    Band {
        category: WeightCategory::Major,
        lower: 8.0,
        upper: 10.9,
        multiplier: 8,
    },
    Band {
        category: WeightCategory::Critical,
        lower: 11.0,
        upper: 12.0,
        multiplier: 20,
    },
];

impl WeightCategory {
    pub const ALL: [WeightCategory; 4] = [
        WeightCategory::Minor,
        WeightCategory::Moderate,
        WeightCategory::Major,
        WeightCategory::Critical,
    ];

    pub fn multiplier(self) -> u32 {
        self.band().multiplier
    }

    pub fn band(self) -> &'static Band {
        &BANDS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeightCategory::Minor => "minor",
            WeightCategory::Moderate => "moderate",
            WeightCategory::Major => "major",
            WeightCategory::Critical => "critical",
        }
    }
}

impl fmt::Display for WeightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an absolute weight and return its category and multiplier.
///
/// Bands are tried in ascending order. A magnitude that falls between two
/// listed bands (e.g. `4.95`) belongs to the lower one, so every value in
/// `[0.1, 12.0]` has exactly one category.
pub fn categorize(abs_weight: f64) -> Result<(WeightCategory, u32)> {
    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&abs_weight) {
        // NaN lands here too
        return Err(ScoringError::OutOfRange { weight: abs_weight });
    }

    for (i, band) in BANDS.iter().enumerate() {
        let below_next = BANDS
            .get(i + 1)
            .map_or(abs_weight <= band.upper, |next| abs_weight < next.lower);
        if abs_weight >= band.lower && below_next {
            return Ok((band.category, band.multiplier));
        }
    }

    Err(ScoringError::OutOfRange { weight: abs_weight })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_resolve_deterministically() {
        assert_eq!(categorize(0.1).unwrap(), (WeightCategory::Minor, 1));
        assert_eq!(categorize(4.9).unwrap(), (WeightCategory::Minor, 1));
        assert_eq!(categorize(5.0).unwrap(), (WeightCategory::Moderate, 3));
        assert_eq!(categorize(7.9).unwrap(), (WeightCategory::Moderate, 3));
        assert_eq!(categorize(8.0).unwrap(), (WeightCategory::Major, 8));
        assert_eq!(categorize(10.9).unwrap(), (WeightCategory::Major, 8));
        assert_eq!(categorize(11.0).unwrap(), (WeightCategory::Critical, 20));
        assert_eq!(categorize(12.0).unwrap(), (WeightCategory::Critical, 20));
    }

    #[test]
    fn every_tenth_in_range_has_a_category() {
        for tenths in 1..=120 {
            let w = tenths as f64 / 10.0;
            assert!(categorize(w).is_ok(), "weight {w} should categorize");
        }
    }

    #[test]
    fn between_bands_falls_to_lower() {
        assert_eq!(categorize(4.95).unwrap().0, WeightCategory::Minor);
        assert_eq!(categorize(10.95).unwrap().0, WeightCategory::Major);
    }

    #[test]
    fn out_of_range_is_rejected() {
        for w in [0.0, -1.0, 0.05, 12.01, 100.0, f64::NAN] {
            assert!(
                matches!(categorize(w), Err(ScoringError::OutOfRange { .. })),
                "weight {w} should be rejected"
            );
        }
    }

    #[test]
    fn band_table_matches_enum_order() {
        for c in WeightCategory::ALL {
            assert_eq!(c.band().category, c);
        }
        assert_eq!(WeightCategory::Critical.multiplier(), 20);
        assert_eq!(WeightCategory::Moderate.to_string(), "moderate");
    }
}
