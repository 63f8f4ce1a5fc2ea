//! # Narrative Trend
//! Combines two channels into short- and long-term trend scores:
//!
//! 1. scenario linkages: each linked assessment contributes its 30-day
//!    activity (short) and its lifetime net adjusted weight (long), scaled by
//!    potency and flipped for inverse relationships;
//! 2. resolution conditions: each fulfilled condition contributes a fixed
//!    score by weight and polarity; the long-term share is a quarter of it.
//!
//! Event histories and fulfilment checks come from a caller-supplied
//! [`NarrativeSource`], so the calculation itself stays pure.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::Result;
use crate::event::{round_dp, WeightedEvent};
use crate::probability::{calculate_batch, WindowType};
use crate::rolling;
use crate::trend::TrendResult;
use crate::volatility;

/// Long-term share of a fulfilled condition's short-term score.
pub const CONDITION_LONG_FACTOR: f64 = 0.25;
/// Score for a condition whose weight is not one of 1.5 / 1.0 / 0.5.
pub const CONDITION_DEFAULT_SCORE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Direct,
    Inverse,
}

impl Relationship {
    pub fn direction(self) -> f64 {
        match self {
            Relationship::Direct => 1.0,
            Relationship::Inverse => -1.0,
        }
    }
}

impl From<bool> for Relationship {
    fn from(direct: bool) -> Self {
        if direct {
            Relationship::Direct
        } else {
            Relationship::Inverse
        }
    }
}

/// Link from a narrative to one analyst's scenario assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeLinkage {
    pub marked_scenario_id: i64,
    pub relationship: Relationship,
    #[serde(default = "default_potency")]
    pub potency: f64,
}

fn default_potency() -> f64 {
    1.0
}

/// Predicate over recorded events: entity + action before the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionCondition {
    pub entity_code: String,
    pub action_code: String,
    /// `true` pushes the narrative up when fulfilled.
    pub polarity: bool,
    /// Expected to be 1.5, 1.0 or 0.5.
    pub weight: f64,
}

impl ResolutionCondition {
    /// Signed short-term contribution once fulfilled.
    pub fn short_score(&self) -> f64 {
        let sign = if self.polarity { 1.0 } else { -1.0 };
        condition_base_score(self.weight) * sign
    }
}

/// Fixed score for a condition weight.
pub fn condition_base_score(weight: f64) -> f64 {
    const EPS: f64 = 1e-9;
    if (weight - 1.5).abs() < EPS {
        0.65
    } else if (weight - 1.0).abs() < EPS {
        0.35
    } else if (weight - 0.5).abs() < EPS {
        0.2
    } else {
        CONDITION_DEFAULT_SCORE
    }
}

/// Narrative as consumed by the trend calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub narrative_code: String,
    /// Conditions count only for events recorded before midnight (UTC) of this day.
    pub res_horizon: NaiveDate,
    #[serde(default)]
    pub linkages: Vec<NarrativeLinkage>,
    #[serde(default)]
    pub conditions: Vec<ResolutionCondition>,
}

/// Recorded event as seen by resolution matching and the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_code: String,
    #[serde(default)]
    pub event_actor: Option<String>,
    #[serde(default)]
    pub action_code: Option<String>,
    pub rec_timestamp: DateTime<Utc>,
}

/// Lookups the trend calculation needs from the storage layer.
pub trait NarrativeSource {
    /// Full (unwindowed) event-weight history of one assessment.
    fn scenario_events(&self, marked_scenario_id: i64) -> Vec<WeightedEvent>;

    /// Whether any recorded event fulfils `condition` by `horizon`.
    fn condition_fulfilled(&self, condition: &ResolutionCondition, horizon: NaiveDate) -> bool;
}

/// Does `event` fulfil `condition`?
///
/// Actor must contain the entity code (case-insensitive), the action code
/// must match exactly and the event must be recorded before the start of
/// the horizon day (UTC midnight).
pub fn matches_condition(
    event: &RecordedEvent,
    condition: &ResolutionCondition,
    horizon: NaiveDate,
) -> bool {
    let actor_hit = event.event_actor.as_deref().is_some_and(|actor| {
        actor
            .to_lowercase()
            .contains(&condition.entity_code.to_lowercase())
    });
    actor_hit
        && event.action_code.as_deref() == Some(condition.action_code.as_str())
        && event.rec_timestamp < horizon_start(horizon)
}

fn horizon_start(horizon: NaiveDate) -> DateTime<Utc> {
    horizon.and_time(NaiveTime::MIN).and_utc()
}

/// Source backed by in-memory snapshots.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNarrativeSource {
    pub scenarios: HashMap<i64, Vec<WeightedEvent>>,
    pub recorded: Vec<RecordedEvent>,
}

impl InMemoryNarrativeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scenario(mut self, marked_scenario_id: i64, events: Vec<WeightedEvent>) -> Self {
        self.scenarios.insert(marked_scenario_id, events);
        self
    }

    pub fn with_recorded(mut self, recorded: Vec<RecordedEvent>) -> Self {
        self.recorded.extend(recorded);
        self
    }
}

impl NarrativeSource for InMemoryNarrativeSource {
    fn scenario_events(&self, marked_scenario_id: i64) -> Vec<WeightedEvent> {
        self.scenarios
            .get(&marked_scenario_id)
            .cloned()
            .unwrap_or_default()
    }

    fn condition_fulfilled(&self, condition: &ResolutionCondition, horizon: NaiveDate) -> bool {
        self.recorded
            .iter()
            .any(|e| matches_condition(e, condition, horizon))
    }
}

/// Short- and long-term trend for `narrative` at `reference`.
pub fn calculate_trend<S>(
    narrative: &Narrative,
    source: &S,
    reference: DateTime<Utc>,
) -> Result<TrendResult>
where
    S: NarrativeSource + ?Sized,
{
    let mut short = 0.0;
    let mut long = 0.0;
    let mut scenario_count = 0;

    // Channel 1: scenario linkages
    for link in &narrative.linkages {
        let events = source.scenario_events(link.marked_scenario_id);
        if events.is_empty() {
            continue;
        }
        scenario_count += 1;

        let scale = link.potency * link.relationship.direction() / 100.0;

        let recent = rolling::filter_30day(&events, reference);
        let vol = volatility::calculate(&recent)?;
        let vel = volatility::velocity(vol.volatility_score, vol.event_count);
        let short_part = (vol.volatility_score + vel) / 2.0 * scale;

        let lifetime = calculate_batch(&events, WindowType::default())?;
        let long_part = lifetime.adjusted_weight * scale;

        debug!(
            target: "scoring",
            narrative = %narrative.narrative_code,
            scenario = link.marked_scenario_id,
            short_part,
            long_part,
            "scenario contribution"
        );
        short += short_part;
        long += long_part;
    }

    // Channel 2: resolution conditions
    let mut fulfilled = 0;
    for cond in &narrative.conditions {
        if !source.condition_fulfilled(cond, narrative.res_horizon) {
            continue;
        }
        fulfilled += 1;
        let s = cond.short_score();
        short += s;
        long += s * CONDITION_LONG_FACTOR;
    }

    Ok(TrendResult::new(
        round_dp(short, 4),
        round_dp(long, 4),
        scenario_count,
        fulfilled,
    ))
}

/// 30-day activity of one linked assessment, as shown next to the linkage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// `None` when the window holds no events.
    pub volatility: Option<f64>,
    pub velocity: Option<f64>,
}

pub fn scenario_metrics(
    events: &[WeightedEvent],
    reference: DateTime<Utc>,
) -> Result<ScenarioMetrics> {
    let recent = rolling::filter_30day(events, reference);
    if recent.is_empty() {
        return Ok(ScenarioMetrics::default());
    }
    let vol = volatility::calculate(&recent)?;
    Ok(ScenarioMetrics {
        volatility: Some(vol.volatility_score),
        velocity: Some(volatility::velocity(vol.volatility_score, vol.event_count)),
    })
}

/// Descriptive metadata over the events behind a narrative's linkages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NarrativeSummary {
    pub total_event_count: usize,
    pub most_common_action: Option<String>,
    /// Third dot-separated part of the event code.
    pub most_common_region: Option<String>,
    pub most_common_actor: Option<String>,
}

pub fn summarize(events: &[RecordedEvent]) -> NarrativeSummary {
    if events.is_empty() {
        return NarrativeSummary::default();
    }

    let actions = events
        .iter()
        .filter_map(|e| e.action_code.as_deref())
        .filter(|s| !s.is_empty());
    let regions = events
        .iter()
        .filter_map(|e| e.event_code.split('.').nth(2));
    let actors = events
        .iter()
        .filter_map(|e| e.event_actor.as_deref())
        .filter(|s| !s.is_empty());

    NarrativeSummary {
        total_event_count: events.len(),
        most_common_action: most_common(actions),
        most_common_region: most_common(regions),
        most_common_actor: most_common(actors),
    }
}

/// Highest count wins; ties go to the value seen first.
fn most_common<'a>(items: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(k, _)| *k == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (k, n) in counts {
        match best {
            Some((_, b)) if n <= b => {}
            _ => best = Some((k, n)),
        }
    }
    best.map(|(k, _)| k.to_string())
}
