//! Stage 4 — POI scoring, ranking and call-to-action synthesis.
//!
//! Scores a read-only POI catalog against the user's goal and current pose,
//! then surfaces the top-K as fresh `RankedPoi` copies. Ties keep catalog
//! order (the sort is stable), so providers control tie precedence the same
//! way geofence providers control scan priority.

use nav_types::{
    ArAnchor, CallToAction, CtaKind, PoiKind, PoiRanking, PoiRecord, Pose, RankedPoi, UserGoal,
};

use crate::config::RankerConfig;

/// Rank the catalog and build AR surfacing hints.
///
/// Scoring per POI: catalog priority (or the default), raised to the
/// interest floor when the POI matches a goal category, overridden to 1.0
/// for the goal POI itself, plus a linear proximity bonus inside the
/// proximity radius, clamped to 1.0.
pub fn rank(
    catalog: &[PoiRecord],
    goal: Option<&UserGoal>,
    pose: Option<&Pose>,
    top_k: usize,
    cfg: &RankerConfig,
) -> PoiRanking {
    let target_id = goal.and_then(|g| g.target_poi_id.as_deref());
    let interests = goal.and_then(|g| g.interest_categories.as_deref());

    let mut scored: Vec<(&PoiRecord, f64)> = catalog
        .iter()
        .map(|poi| (poi, score_poi(poi, target_id, interests, pose, cfg)))
        .collect();

    // Stable descending sort — equal scores keep catalog order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);

    let top_pois: Vec<RankedPoi> = scored
        .iter()
        .map(|(poi, score)| RankedPoi {
            id: poi.id.clone(),
            name: poi.name.clone(),
            kind: poi.kind,
            position: poi.position,
            score: *score,
            anchor_hint: pose.and_then(|p| anchor_hint(poi, p, cfg)),
        })
        .collect();

    let cta = build_cta(&top_pois, target_id, cfg);

    PoiRanking { top_pois, cta }
}

fn score_poi(
    poi: &PoiRecord,
    target_id: Option<&str>,
    interests: Option<&[PoiKind]>,
    pose: Option<&Pose>,
    cfg: &RankerConfig,
) -> f64 {
    let mut score = poi.priority.unwrap_or(cfg.default_priority);

    if interests.is_some_and(|cats| cats.contains(&poi.kind)) {
        score = score.max(cfg.interest_boost);
    }

    // Goal POIs always rank first.
    if target_id == Some(poi.id.as_str()) {
        score = 1.0;
    }

    if let Some(pose) = pose {
        if let Some(d) = pose.distance_to(&poi.position) {
            if d < cfg.proximity_radius_m {
                score += (1.0 - d / cfg.proximity_radius_m) * cfg.proximity_weight;
            }
        }
    }

    score.min(1.0)
}

/// Unit vector from pose to POI, scaled to at most `anchor_range_m`, at a
/// fixed display height. `None` for cross-floor POIs, frame mismatches, and
/// zero distance (no direction to point at).
fn anchor_hint(poi: &PoiRecord, pose: &Pose, cfg: &RankerConfig) -> Option<ArAnchor> {
    if poi.position.floor().is_some_and(|f| f != pose.floor) {
        return None;
    }

    let (dx, dy) = pose.displacement_to(&poi.position)?;
    let d = (dx * dx + dy * dy).sqrt();
    if d <= 0.0 {
        return None;
    }

    let scale = d.min(cfg.anchor_range_m);
    Some(ArAnchor {
        x: dx / d * scale,
        y: cfg.anchor_height_m,
        z: dy / d * scale,
    })
}

/// Call-to-action hints for the leading ranked POIs. Returns `None` — not an
/// empty list — when nothing qualifies.
fn build_cta(
    top_pois: &[RankedPoi],
    target_id: Option<&str>,
    cfg: &RankerConfig,
) -> Option<Vec<CallToAction>> {
    let mut cta = Vec::new();

    for poi in top_pois.iter().take(cfg.cta_count) {
        if target_id == Some(poi.id.as_str()) {
            cta.push(CallToAction {
                kind: CtaKind::Navigate,
                poi_id: poi.id.clone(),
                label: format!("{} 이동", poi.name),
            });
            continue;
        }
        match poi.kind {
            PoiKind::Store | PoiKind::Restaurant => cta.push(CallToAction {
                kind: CtaKind::Enter,
                poi_id: poi.id.clone(),
                label: format!("{} 입장", poi.name),
            }),
            PoiKind::Exhibit => cta.push(CallToAction {
                kind: CtaKind::ViewInfo,
                poi_id: poi.id.clone(),
                label: format!("{} 정보 보기", poi.name),
            }),
            _ => {}
        }
    }

    if cta.is_empty() {
        None
    } else {
        Some(cta)
    }
}
