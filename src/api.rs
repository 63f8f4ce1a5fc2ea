use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::engine::{calculate_all_metrics, WindowMetrics, WindowSpec};
use crate::error::ScoringError;
use crate::event::WeightedEvent;
use crate::highlight::highlight_cie;
use crate::history::{Assessment, HistoryEntry, LinkedEvent};
use crate::metrics::{record_assessment_change, record_calculation, record_rejection};
use crate::narrative::{
    calculate_trend, scenario_metrics, summarize, InMemoryNarrativeSource, Narrative,
    NarrativeSummary, RecordedEvent, ScenarioMetrics,
};
use crate::probability::{
    calculate_batch, calculate_immediate, BatchResult, CalculationResult, WindowType,
};
use crate::trend::TrendResult;
use crate::volatility::{self, VolatilityResult};

#[derive(Clone)]
pub struct AppState {
    assessments: Arc<RwLock<HashMap<u64, Assessment>>>,
    next_id: Arc<AtomicU64>,
    history_limit: usize,
}

impl AppState {
    pub fn new(history_limit: usize) -> Self {
        Self {
            assessments: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            history_limit,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/probability/immediate", post(probability_immediate))
        .route("/probability/batch", post(probability_batch))
        .route("/volatility", post(volatility_route))
        .route("/metrics/window", post(window_metrics))
        .route("/narratives/trend", post(narrative_trend))
        .route("/highlight", post(highlight))
        .route("/assessments", post(create_assessment))
        .route("/assessments/{id}", get(get_assessment))
        .route("/assessments/{id}/links", post(link_event))
        .route("/assessments/{id}/links/{code}", delete(unlink_event))
        .with_state(state)
}

// ---- errors ----

#[derive(Debug)]
pub enum ApiError {
    Scoring(ScoringError),
    NotFound(String),
}

impl From<ScoringError> for ApiError {
    fn from(e: ScoringError) -> Self {
        ApiError::Scoring(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Scoring(e @ ScoringError::OutOfRange { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ApiError::Scoring(e @ ScoringError::InvalidArgument(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

/// Count and log a rejected calculation before it becomes a response.
fn reject(op: &'static str, e: ScoringError) -> ApiError {
    let kind = match &e {
        ScoringError::OutOfRange { .. } => "out_of_range",
        ScoringError::InvalidArgument(_) => "invalid_argument",
    };
    warn!(op, error = %e, "request rejected");
    record_rejection(op, kind);
    ApiError::Scoring(e)
}

fn not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("assessment {id} not found"))
}

// ---- calculators ----

#[derive(Deserialize)]
struct ImmediateReq {
    weight: f64,
}

async fn probability_immediate(
    Json(body): Json<ImmediateReq>,
) -> Result<Json<CalculationResult>, ApiError> {
    let res = calculate_immediate(body.weight).map_err(|e| reject("immediate", e))?;
    record_calculation("immediate");
    Ok(Json(res))
}

#[derive(Deserialize)]
struct BatchReq {
    #[serde(default)]
    events: Vec<WeightedEvent>,
    #[serde(default)]
    window_type: Option<String>,
}

async fn probability_batch(Json(body): Json<BatchReq>) -> Result<Json<BatchResult>, ApiError> {
    let window = match body.window_type.as_deref() {
        Some(label) => label
            .parse::<WindowType>()
            .map_err(|e| reject("batch", e))?,
        None => WindowType::default(),
    };
    let res = calculate_batch(&body.events, window).map_err(|e| reject("batch", e))?;
    record_calculation("batch");
    Ok(Json(res))
}

#[derive(Deserialize)]
struct EventsReq {
    #[serde(default)]
    events: Vec<WeightedEvent>,
}

#[derive(Serialize)]
struct VolatilityResp {
    #[serde(flatten)]
    volatility: VolatilityResult,
    velocity: f64,
}

async fn volatility_route(Json(body): Json<EventsReq>) -> Result<Json<VolatilityResp>, ApiError> {
    let vol = volatility::calculate(&body.events).map_err(|e| reject("volatility", e))?;
    let velocity = volatility::velocity(vol.volatility_score, vol.event_count);
    record_calculation("volatility");
    Ok(Json(VolatilityResp {
        volatility: vol,
        velocity,
    }))
}

#[derive(Deserialize)]
struct WindowReq {
    #[serde(default)]
    events: Vec<WeightedEvent>,
    window: String,
    /// Defaults to now.
    #[serde(default)]
    reference: Option<DateTime<Utc>>,
}

async fn window_metrics(Json(body): Json<WindowReq>) -> Result<Json<WindowMetrics>, ApiError> {
    let window: WindowSpec = body.window.parse().map_err(|e| reject("window", e))?;
    let reference = body.reference.unwrap_or_else(Utc::now);
    let res =
        calculate_all_metrics(&body.events, window, reference).map_err(|e| reject("window", e))?;
    record_calculation("window");
    Ok(Json(res))
}

#[derive(Deserialize)]
struct TrendReq {
    narrative: Narrative,
    /// Event history per linked assessment id.
    #[serde(default)]
    scenarios: HashMap<i64, Vec<WeightedEvent>>,
    #[serde(default)]
    recorded: Vec<RecordedEvent>,
    #[serde(default)]
    reference: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct TrendResp {
    narrative_code: String,
    trend: TrendResult,
    summary: NarrativeSummary,
    scenario_metrics: HashMap<i64, ScenarioMetrics>,
}

async fn narrative_trend(Json(body): Json<TrendReq>) -> Result<Json<TrendResp>, ApiError> {
    let reference = body.reference.unwrap_or_else(Utc::now);
    let summary = summarize(&body.recorded);

    // only scenarios the narrative links to
    let mut per_scenario = HashMap::with_capacity(body.narrative.linkages.len());
    for link in &body.narrative.linkages {
        let events = body
            .scenarios
            .get(&link.marked_scenario_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let m = scenario_metrics(events, reference).map_err(|e| reject("trend", e))?;
        per_scenario.insert(link.marked_scenario_id, m);
    }

    let source = InMemoryNarrativeSource {
        scenarios: body.scenarios,
        recorded: body.recorded,
    };
    let trend =
        calculate_trend(&body.narrative, &source, reference).map_err(|e| reject("trend", e))?;
    record_calculation("trend");

    Ok(Json(TrendResp {
        narrative_code: body.narrative.narrative_code,
        trend,
        summary,
        scenario_metrics: per_scenario,
    }))
}

#[derive(Deserialize)]
struct HighlightReq {
    text: String,
}

async fn highlight(Json(body): Json<HighlightReq>) -> Json<serde_json::Value> {
    record_calculation("highlight");
    Json(json!({ "html": highlight_cie(&body.text) }))
}

// ---- assessments ----

#[derive(Deserialize)]
struct CreateAssessmentReq {
    initial_probability: f64,
    user_id: i64,
}

#[derive(Serialize)]
struct AssessmentView {
    id: u64,
    initial_probability: f64,
    current_probability: f64,
    history: Vec<HistoryEntry>,
    links: Vec<LinkedEvent>,
    /// Batch windows over the linked events, as of now.
    windows: Vec<WindowMetrics>,
}

fn view(id: u64, a: &Assessment, history_limit: usize) -> Result<AssessmentView, ApiError> {
    let events = a.events();
    let now = Utc::now();
    let windows = [WindowType::OneDay, WindowType::SevenDay, WindowType::ThirtyDay]
        .into_iter()
        .map(|w| calculate_all_metrics(&events, WindowSpec::Batch(w), now))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AssessmentView {
        id,
        initial_probability: a.initial_probability(),
        current_probability: a.current_probability(),
        history: a.history_last_n(history_limit).to_vec(),
        links: a.links().to_vec(),
        windows,
    })
}

async fn create_assessment(
    State(state): State<AppState>,
    Json(body): Json<CreateAssessmentReq>,
) -> Result<(StatusCode, Json<AssessmentView>), ApiError> {
    let assessment = Assessment::new(body.initial_probability, body.user_id, Utc::now())
        .map_err(|e| reject("assessment", e))?;
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    let out = view(id, &assessment, state.history_limit)?;

    state.assessments.write().await.insert(id, assessment);
    record_assessment_change("created");
    info!(id, user_id = body.user_id, "assessment created");
    Ok((StatusCode::CREATED, Json(out)))
}

async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<AssessmentView>, ApiError> {
    let guard = state.assessments.read().await;
    let a = guard.get(&id).ok_or_else(|| not_found(id))?;
    Ok(Json(view(id, a, state.history_limit)?))
}

#[derive(Deserialize)]
struct LinkReq {
    event_code: String,
    weight: f64,
    user_id: i64,
    #[serde(default)]
    notes: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    linked_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ChangeResp {
    current_probability: f64,
    entry: HistoryEntry,
}

async fn link_event(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<LinkReq>,
) -> Result<Json<ChangeResp>, ApiError> {
    let mut guard = state.assessments.write().await;
    let a = guard.get_mut(&id).ok_or_else(|| not_found(id))?;
    let at = body.linked_at.unwrap_or_else(Utc::now);

    let entry = a
        .link_event(&body.event_code, body.weight, body.user_id, body.notes, at)
        .map_err(|e| reject("link", e))?
        .clone();
    record_assessment_change("linked");
    info!(id, event_code = %body.event_code, weight = body.weight, "event linked");

    Ok(Json(ChangeResp {
        current_probability: a.current_probability(),
        entry,
    }))
}

#[derive(Deserialize)]
struct UnlinkParams {
    user_id: i64,
}

async fn unlink_event(
    State(state): State<AppState>,
    Path((id, code)): Path<(u64, String)>,
    params: Result<Query<UnlinkParams>, QueryRejection>,
) -> Result<Json<ChangeResp>, ApiError> {
    let Query(params) =
        params.map_err(|e| reject("unlink", ScoringError::invalid(e.body_text())))?;
    let mut guard = state.assessments.write().await;
    let a = guard.get_mut(&id).ok_or_else(|| not_found(id))?;

    let entry = a
        .unlink_event(&code, params.user_id, Utc::now())
        .map_err(|e| reject("unlink", e))?
        .clone();
    record_assessment_change("unlinked");
    info!(id, event_code = %code, "event unlinked");

    Ok(Json(ChangeResp {
        current_probability: a.current_probability(),
        entry,
    }))
}
