//! history.rs: assessment state with an append-only probability log.
//!
//! An assessment owns its current probability, the events linked to it and
//! the history of every change. Linking applies the immediate adjustment of
//! the event's weight; unlinking repeats that calculation for the stored
//! weight and subtracts it. Both clamp to `[0, 1]` and append one entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::category::MAX_WEIGHT;
use crate::error::{Result, ScoringError};
use crate::event::WeightedEvent;
use crate::probability::calculate_immediate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub probability: f64,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub event_code: Option<String>,
    pub user_id: Option<i64>,
    /// Signed change applied to the previous probability, before clamping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEvent {
    pub event_code: String,
    pub weight: f64,
    pub linked_at: DateTime<Utc>,
    pub linked_by: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One analyst's probability assessment of a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    initial_probability: f64,
    current_probability: f64,
    history: Vec<HistoryEntry>,
    links: Vec<LinkedEvent>,
}

impl Assessment {
    /// Start an assessment at `initial_probability` (must lie in `[0, 1]`).
    pub fn new(initial_probability: f64, user_id: i64, at: DateTime<Utc>) -> Result<Self> {
        if !(0.0..=1.0).contains(&initial_probability) {
            return Err(ScoringError::invalid(format!(
                "probability must be between 0 and 1, got {initial_probability}"
            )));
        }
        Ok(Self {
            initial_probability,
            current_probability: initial_probability,
            history: vec![HistoryEntry {
                probability: initial_probability,
                timestamp: at,
                reason: "Initial assessment".to_string(),
                event_code: None,
                user_id: Some(user_id),
                adjustment: None,
            }],
            links: Vec::new(),
        })
    }

    pub fn initial_probability(&self) -> f64 {
        self.initial_probability
    }

    pub fn current_probability(&self) -> f64 {
        self.current_probability
    }

    /// Full history, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Last `n` history entries, oldest first.
    pub fn history_last_n(&self, n: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn links(&self) -> &[LinkedEvent] {
        &self.links
    }

    /// Snapshot of linked events for the calculators.
    pub fn events(&self) -> Vec<WeightedEvent> {
        self.links
            .iter()
            .map(|l| WeightedEvent::new(l.event_code.clone(), l.weight, l.linked_at))
            .collect()
    }

    /// Link `event_code` with `weight` and apply its immediate adjustment.
    pub fn link_event(
        &mut self,
        event_code: &str,
        weight: f64,
        user_id: i64,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<&HistoryEntry> {
        validate_link_weight(weight)?;
        if self.links.iter().any(|l| l.event_code == event_code) {
            return Err(ScoringError::invalid(format!(
                "event {event_code} is already linked to this assessment"
            )));
        }

        let calc = calculate_immediate(weight)?;
        self.links.push(LinkedEvent {
            event_code: event_code.to_string(),
            weight,
            linked_at: at,
            linked_by: user_id,
            notes,
        });

        Ok(self.apply(
            calc.probability_adjustment,
            format!("Event {event_code} linked with weight {weight}"),
            event_code,
            user_id,
            at,
        ))
    }

    /// Remove the link for `event_code` and reverse its immediate adjustment.
    ///
    /// The reversal recomputes the stored weight's immediate adjustment; it
    /// does not replay the remaining events, so after clamping the result
    /// may differ from never having linked the event.
    pub fn unlink_event(
        &mut self,
        event_code: &str,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<&HistoryEntry> {
        let Some(pos) = self.links.iter().position(|l| l.event_code == event_code) else {
            return Err(ScoringError::invalid(format!(
                "event {event_code} is not linked to this assessment"
            )));
        };

        let weight = self.links[pos].weight;
        let calc = calculate_immediate(weight)?;
        self.links.remove(pos);

        Ok(self.apply(
            -calc.probability_adjustment,
            format!("Event {event_code} unlinked (weight {weight} removed)"),
            event_code,
            user_id,
            at,
        ))
    }

    fn apply(
        &mut self,
        adjustment: f64,
        reason: String,
        event_code: &str,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> &HistoryEntry {
        let previous = self.current_probability;
        let next = (previous + adjustment).clamp(0.0, 1.0);
        if next != previous + adjustment {
            debug!(target: "scoring", previous, adjustment, next, "probability clamped");
        }
        self.current_probability = next;

        self.history.push(HistoryEntry {
            probability: next,
            timestamp: at,
            reason,
            event_code: Some(event_code.to_string()),
            user_id: Some(user_id),
            adjustment: Some(adjustment),
        });
        &self.history[self.history.len() - 1]
    }
}

/// Input validation for a link weight: non-zero, within ±12.0, 0.1 steps.
pub fn validate_link_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() {
        return Err(ScoringError::invalid("invalid weight value"));
    }
    if weight == 0.0 {
        return Err(ScoringError::invalid(
            "weight cannot be zero; use a value between -12.0 and +12.0",
        ));
    }
    if weight.abs() > MAX_WEIGHT {
        return Err(ScoringError::invalid("weight must be between -12.0 and +12.0"));
    }
    let tenths = weight * 10.0;
    if (tenths.round() - tenths).abs() > 0.01 {
        warn!(weight, "rejected link weight off the 0.1 grid");
        return Err(ScoringError::invalid(
            "weight must be in 0.1 increments (e.g. 3.5, -7.2, 11.0)",
        ));
    }
    Ok(())
}
