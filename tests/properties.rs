//! Seeded randomized checks over the calculators.
//! Weights are drawn on the 0.1 grid within ±12.0, as the link validation allows.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use narrative_engine::category::{categorize, BANDS, MAX_WEIGHT, MIN_WEIGHT};
use narrative_engine::engine::{calculate_all_metrics, WindowSpec};
use narrative_engine::probability::{calculate_batch, calculate_immediate, WindowType};
use narrative_engine::volatility;
use narrative_engine::WeightedEvent;

const SEED: u64 = 0x5EED_CAFE;
const ROUNDS: usize = 500;

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

fn random_weight(rng: &mut StdRng) -> f64 {
    let tenths: i32 = rng.random_range(1..=120);
    let w = tenths as f64 / 10.0;
    if rng.random_bool(0.5) {
        w
    } else {
        -w
    }
}

fn random_events(rng: &mut StdRng, n: usize) -> Vec<WeightedEvent> {
    (0..n)
        .map(|i| {
            let hours_back: i64 = rng.random_range(0..24 * 45);
            WeightedEvent::new(
                format!("evt-{i}"),
                random_weight(rng),
                reference() - Duration::hours(hours_back),
            )
        })
        .collect()
}

#[test]
fn every_grid_weight_has_exactly_one_band() {
    for tenths in 1..=120 {
        let w = tenths as f64 / 10.0;
        let (category, multiplier) = categorize(w).expect("in range");
        let band = category.band();
        assert!(w >= band.lower - 1e-9 && w <= band.upper + 1e-9, "w={w}");
        assert_eq!(band.multiplier, multiplier);
        let hits = BANDS
            .iter()
            .filter(|b| w >= b.lower - 1e-9 && w <= b.upper + 1e-9)
            .count();
        assert_eq!(hits, 1, "w={w}");
    }
    assert!(categorize(MIN_WEIGHT - 0.05).is_err());
    assert!(categorize(MAX_WEIGHT + 0.05).is_err());
}

#[test]
fn immediate_sign_follows_weight() {
    let mut rng = StdRng::seed_from_u64(SEED);
    for _ in 0..ROUNDS {
        let w = random_weight(&mut rng);
        let r = calculate_immediate(w).unwrap();
        assert_eq!(r.probability_adjustment > 0.0, w > 0.0, "w={w}");
        let mirrored = calculate_immediate(-w).unwrap();
        assert_eq!(
            r.probability_adjustment,
            -mirrored.probability_adjustment,
            "w={w}"
        );
    }
}

#[test]
fn volatility_ignores_direction_and_bounds_batch() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 1);
    for _ in 0..ROUNDS / 10 {
        let n = rng.random_range(1..20);
        let events = random_events(&mut rng, n);
        let flipped: Vec<WeightedEvent> = events
            .iter()
            .map(|e| WeightedEvent::new(e.event_code.clone(), -e.weight, e.timestamp))
            .collect();

        let a = volatility::calculate(&events).unwrap();
        let b = volatility::calculate(&flipped).unwrap();
        assert_eq!(a.volatility_score, b.volatility_score);
        assert!(a.volatility_score >= 0.0);

        // signed sums can only cancel, never exceed the unsigned total
        let batch = calculate_batch(&events, WindowType::ThirtyDay).unwrap();
        assert!(batch.adjusted_weight.abs() <= a.volatility_score + 1e-6);

        let flipped_batch = calculate_batch(&flipped, WindowType::ThirtyDay).unwrap();
        assert!((batch.adjusted_weight + flipped_batch.adjusted_weight).abs() < 1e-6);
    }
}

#[test]
fn wider_windows_never_hold_fewer_events() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 2);
    for _ in 0..ROUNDS / 10 {
        let events = random_events(&mut rng, 30);
        let count = |w| {
            calculate_all_metrics(&events, WindowSpec::Batch(w), reference())
                .unwrap()
                .event_count
        };
        let (d1, d7, d30) = (
            count(WindowType::OneDay),
            count(WindowType::SevenDay),
            count(WindowType::ThirtyDay),
        );
        assert!(d1 <= d7 && d7 <= d30, "{d1} {d7} {d30}");
        assert!(d30 <= events.len());
    }
}

#[test]
fn velocity_is_volatility_per_event() {
    let mut rng = StdRng::seed_from_u64(SEED ^ 3);
    for _ in 0..ROUNDS / 10 {
        let n = rng.random_range(1..15);
        let events = random_events(&mut rng, n);
        let vol = volatility::calculate(&events).unwrap();
        let vel = volatility::velocity(vol.volatility_score, vol.event_count);
        assert!((vel - vol.volatility_score / n as f64).abs() <= 0.005 + 1e-9);
    }
    assert_eq!(volatility::velocity(0.0, 0), 0.0);
}
