//! One full engine tick — the four stages wired together.
//!
//! Mode feeds pose selection, pose feeds guidance and ranking. The tick is
//! best-effort end to end: a route with no steps degrades to `guidance:
//! null` here (the dedicated guidance operation still fails hard), because a
//! hard failure mid-navigation is worse than a partial answer.

use serde::{Deserialize, Serialize};

use nav_types::{
    Geofence, GpsFix, GuidanceAction, ModeDecision, PoiRanking, PoiRecord, Pose, PoseEstimate,
    Route, TravelMode, UserGoal,
};

use crate::config::EngineConfig;
use crate::state::now_ms;
use crate::{guidance_planner, mode_classifier, poi_ranker, pose_estimator};

/// Everything one tick consumes. Catalog fields are optional so transports
/// can substitute server-held catalogs when the client omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickInput {
    pub gps: GpsFix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geofences: Option<Vec<Geofence>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vps_result: Option<PoseEstimate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pois: Option<Vec<PoiRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_goal: Option<UserGoal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

/// Decisions of all four stages for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickOutput {
    pub mode: ModeDecision,
    pub pose: Pose,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<GuidanceAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pois: Option<PoiRanking>,
    pub timestamp: i64,
}

/// Run all four stages over one tick of input.
///
/// `last_pose` is the caller-persisted pose from the previous tick (session
/// continuity is the caller's job). Indoors the pose estimator runs; outdoors
/// and in transition the pose is GPS-backed so geo-frame POIs stay rankable.
pub fn run_tick(
    input: &TickInput,
    geofences: &[Geofence],
    pois: Option<&[PoiRecord]>,
    last_pose: Option<&Pose>,
    cfg: &EngineConfig,
) -> TickOutput {
    let mode = mode_classifier::classify(&input.gps, geofences, &cfg.classifier);

    let pose = if mode.mode == TravelMode::Indoor {
        pose_estimator::estimate(input.vps_result.as_ref(), last_pose, &cfg.estimator)
    } else {
        gps_backed_pose(&input.gps, cfg)
    };

    let guidance = input
        .route
        .as_ref()
        .and_then(|route| guidance_planner::plan(route, &pose, &cfg.planner).ok());

    let pois = pois.map(|catalog| {
        poi_ranker::rank(
            catalog,
            input.user_goal.as_ref(),
            Some(&pose),
            input.top_k.unwrap_or(cfg.ranker.default_top_k),
            &cfg.ranker,
        )
    });

    TickOutput {
        mode,
        pose,
        guidance,
        pois,
        timestamp: now_ms(),
    }
}

/// Outdoor/transition pose: the raw fix carried into the pose type. Local
/// x/y stay at the frame origin; lat/lng keep geo-frame POIs measurable.
fn gps_backed_pose(gps: &GpsFix, cfg: &EngineConfig) -> Pose {
    Pose {
        x: 0.0,
        y: 0.0,
        lat: Some(gps.point.lat),
        lng: Some(gps.point.lng),
        floor: cfg.estimator.fallback_floor,
        heading: gps.heading.unwrap_or(0.0),
        confidence: cfg.estimator.gps_backed_confidence,
        relocalization_needed: false,
        zone_id: None,
    }
}
