//! # Rolling Windows
//! Slices a chronological event list into the windows used by the batch
//! calculators.
//!
//! - 1-day: the UTC calendar day of the reference instant, `[00:00, +1 day)`
//! - 7-day / 30-day: rolling, `timestamp >= reference - N days`
//!
//! Every filter takes an explicit reference instant; defaulting to "now" is
//! left to the call site. Output keeps input order.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::event::WeightedEvent;
use crate::probability::WindowType;

/// Events within the calendar day (UTC) of `reference`.
pub fn filter_1day(events: &[WeightedEvent], reference: DateTime<Utc>) -> Vec<WeightedEvent> {
    let day_start = reference
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc();
    let day_end = day_start + Duration::days(1);

    events
        .iter()
        .filter(|e| e.timestamp >= day_start && e.timestamp < day_end)
        .cloned()
        .collect()
}

/// Events at or after `reference - 7 days`.
pub fn filter_7day(events: &[WeightedEvent], reference: DateTime<Utc>) -> Vec<WeightedEvent> {
    filter_rolling(events, reference, 7)
}

/// Events at or after `reference - 30 days`.
pub fn filter_30day(events: &[WeightedEvent], reference: DateTime<Utc>) -> Vec<WeightedEvent> {
    filter_rolling(events, reference, 30)
}

/// Dispatch by window label.
pub fn filter(
    window: WindowType,
    events: &[WeightedEvent],
    reference: DateTime<Utc>,
) -> Vec<WeightedEvent> {
    match window {
        WindowType::OneDay => filter_1day(events, reference),
        WindowType::SevenDay => filter_7day(events, reference),
        WindowType::ThirtyDay => filter_30day(events, reference),
    }
}

fn filter_rolling(
    events: &[WeightedEvent],
    reference: DateTime<Utc>,
    days: i64,
) -> Vec<WeightedEvent> {
    let cutoff = reference - Duration::days(days);
    events
        .iter()
        .filter(|e| e.timestamp >= cutoff)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn ev(code: &str, ts: DateTime<Utc>) -> WeightedEvent {
        WeightedEvent::new(code, 1.0, ts)
    }

    #[test]
    fn seven_day_cutoff_is_inclusive() {
        let reference = at(2025, 3, 15, 12, 0, 0);
        let cutoff = reference - Duration::days(7);
        let events = vec![
            ev("on_cutoff", cutoff),
            ev("just_before", cutoff - Duration::seconds(1)),
        ];
        let out = filter_7day(&events, reference);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].event_code, "on_cutoff");
    }

    #[test]
    fn thirty_day_window() {
        let reference = at(2025, 3, 31, 8, 0, 0);
        let events = vec![
            ev("old", at(2025, 2, 28, 7, 59, 59)),
            ev("edge", at(2025, 3, 1, 8, 0, 0)),
            ev("recent", at(2025, 3, 30, 0, 0, 0)),
        ];
        let codes: Vec<_> = filter_30day(&events, reference)
            .into_iter()
            .map(|e| e.event_code)
            .collect();
        assert_eq!(codes, vec!["edge", "recent"]);
    }

    #[test]
    fn one_day_is_calendar_day_not_rolling() {
        let reference = at(2025, 3, 15, 0, 30, 0);
        let events = vec![
            ev("yesterday_late", at(2025, 3, 14, 23, 59, 59)),
            ev("midnight", at(2025, 3, 15, 0, 0, 0)),
            ev("tonight", at(2025, 3, 15, 23, 59, 59)),
            ev("tomorrow", at(2025, 3, 16, 0, 0, 0)),
        ];
        let codes: Vec<_> = filter_1day(&events, reference)
            .into_iter()
            .map(|e| e.event_code)
            .collect();
        assert_eq!(codes, vec!["midnight", "tonight"]);
    }

    #[test]
    fn order_is_preserved_and_input_untouched() {
        let reference = at(2025, 3, 15, 12, 0, 0);
        let events = vec![
            ev("c", at(2025, 3, 14, 0, 0, 0)),
            ev("a", at(2025, 3, 10, 0, 0, 0)),
            ev("b", at(2025, 3, 12, 0, 0, 0)),
        ];
        let out = filter(WindowType::SevenDay, &events, reference);
        let codes: Vec<_> = out.iter().map(|e| e.event_code.as_str()).collect();
        assert_eq!(codes, vec!["c", "a", "b"]);
        assert_eq!(events.len(), 3);
    }
}
