//! HTTP+JSON operations, one per pipeline stage plus the combined tick.
//!
//! Stage inputs arrive as JSON bodies with the field names of the shared
//! types; malformed bodies are a transport concern and surface as 400 before
//! any handler runs. Catalog fields may be omitted — the server-held
//! catalogs are substituted. Only the guidance operation can fail once the
//! body parses, and that failure is a 400 as well: an empty route is a
//! client error, not an engine fault.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use nav_types::{
    Geofence, GpsFix, GuidanceAction, ModeDecision, PoiRanking, PoiRecord, Pose, PoseEstimate,
    Route, UserGoal,
};

use crate::config::EngineConfig;
use crate::pipeline::{TickInput, TickOutput};
use crate::state::SharedState;
use crate::{guidance_planner, mode_classifier, poi_ranker, pose_estimator};

pub type ApiState = (SharedState, Arc<EngineConfig>);

type ApiError = (StatusCode, Json<Value>);

fn bad_request(reason: &str) -> ApiError {
    warn!("Rejecting request: {reason}");
    (StatusCode::BAD_REQUEST, Json(json!({ "error": reason })))
}

pub fn router(shared: SharedState, cfg: Arc<EngineConfig>) -> Router {
    Router::new()
        .route("/sync", get(time_sync))
        .route("/health", get(|| async { "waypath-backend ok" }))
        .route("/v1/mode/classify", post(classify))
        .route("/v1/pose/estimate", post(estimate))
        .route("/v1/guidance/plan", post(plan))
        .route("/v1/poi/rank", post(rank))
        .route("/v1/tick", post(tick))
        .with_state((shared, cfg))
}

// ─── Time Sync ───────────────────────────────────────────────────────────────

async fn time_sync() -> Json<Value> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    Json(json!({ "serverTime": now }))
}

// ─── Stage 1: Mode Classification ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyRequest {
    gps: GpsFix,
    /// Omitted → the server-held geofence catalog.
    #[serde(default)]
    geofences: Option<Vec<Geofence>>,
}

async fn classify(
    State((shared, cfg)): State<ApiState>,
    Json(req): Json<ClassifyRequest>,
) -> Json<ModeDecision> {
    let decision = match &req.geofences {
        Some(fences) => mode_classifier::classify(&req.gps, fences, &cfg.classifier),
        None => {
            let state = shared.read().await;
            mode_classifier::classify(&req.gps, &state.geofences, &cfg.classifier)
        }
    };
    Json(decision)
}

// ─── Stage 2: Pose Estimation ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateRequest {
    #[serde(default)]
    vps_result: Option<PoseEstimate>,
    #[serde(default)]
    last_known_pose: Option<Pose>,
    /// When set and no explicit last pose is given, the session's stored
    /// pose is used for continuity.
    #[serde(default)]
    session_id: Option<String>,
}

async fn estimate(
    State((shared, cfg)): State<ApiState>,
    Json(req): Json<EstimateRequest>,
) -> Json<Pose> {
    let session_pose = match (&req.last_known_pose, &req.session_id) {
        (None, Some(sid)) => {
            let state = shared.read().await;
            state.sessions.get(sid).and_then(|s| s.last_pose.clone())
        }
        _ => None,
    };
    let last = req.last_known_pose.as_ref().or(session_pose.as_ref());
    Json(pose_estimator::estimate(
        req.vps_result.as_ref(),
        last,
        &cfg.estimator,
    ))
}

// ─── Stage 3: Guidance Planning ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanRequest {
    route: Route,
    current_pose: Pose,
}

async fn plan(
    State((_, cfg)): State<ApiState>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<GuidanceAction>, ApiError> {
    guidance_planner::plan(&req.route, &req.current_pose, &cfg.planner)
        .map(Json)
        .map_err(|e| bad_request(&e.to_string()))
}

// ─── Stage 4: POI Ranking ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankRequest {
    /// Omitted → the server-held POI catalog.
    #[serde(default)]
    catalog: Option<Vec<PoiRecord>>,
    #[serde(default)]
    user_goal: Option<UserGoal>,
    #[serde(default)]
    current_pose: Option<Pose>,
    #[serde(default)]
    top_k: Option<usize>,
}

async fn rank(
    State((shared, cfg)): State<ApiState>,
    Json(req): Json<RankRequest>,
) -> Json<PoiRanking> {
    let top_k = req.top_k.unwrap_or(cfg.ranker.default_top_k);
    let ranking = match &req.catalog {
        Some(catalog) => poi_ranker::rank(
            catalog,
            req.user_goal.as_ref(),
            req.current_pose.as_ref(),
            top_k,
            &cfg.ranker,
        ),
        None => {
            let state = shared.read().await;
            poi_ranker::rank(
                &state.pois,
                req.user_goal.as_ref(),
                req.current_pose.as_ref(),
                top_k,
                &cfg.ranker,
            )
        }
    };
    Json(ranking)
}

// ─── Combined Tick ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(flatten)]
    input: TickInput,
}

async fn tick(
    State((shared, cfg)): State<ApiState>,
    Json(req): Json<TickRequest>,
) -> Json<TickOutput> {
    let (output, _mode_log) =
        crate::handlers::run_session_tick(&shared, &cfg, req.session_id.as_deref(), &req.input)
            .await;
    Json(output)
}
