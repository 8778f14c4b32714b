//! Stage 2 — pose estimation.
//!
//! A deliberately simple two-branch policy, not a filter: trust the visual
//! positioning system when a result is present, otherwise hold the last
//! known pose at low confidence and flag that a fresh visual fix is needed.
//! Callers own pose continuity — they pass the previous pose back in on the
//! next tick.

use nav_types::{Pose, PoseEstimate};

use crate::config::EstimatorConfig;

/// Produce a fresh pose from the available sources.
pub fn estimate(
    vps: Option<&PoseEstimate>,
    last_known: Option<&Pose>,
    cfg: &EstimatorConfig,
) -> Pose {
    if let Some(vps) = vps {
        return Pose {
            x: vps.pose.x,
            y: vps.pose.y,
            lat: None,
            lng: None,
            floor: vps.pose.floor,
            heading: vps.pose.heading,
            confidence: vps.confidence.unwrap_or(cfg.vps_default_confidence),
            relocalization_needed: false,
            zone_id: None,
        };
    }

    // Dead-reckoning hold: carry the previous fields, or start at the frame
    // origin on the fallback floor.
    match last_known {
        Some(last) => Pose {
            confidence: cfg.dead_reckoning_confidence,
            relocalization_needed: true,
            zone_id: last.zone_id.clone(),
            ..*last
        },
        None => Pose {
            x: 0.0,
            y: 0.0,
            lat: None,
            lng: None,
            floor: cfg.fallback_floor,
            heading: 0.0,
            confidence: cfg.dead_reckoning_confidence,
            relocalization_needed: true,
            zone_id: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_types::VpsPose;

    fn vps(conf: Option<f64>) -> PoseEstimate {
        PoseEstimate {
            pose: VpsPose {
                x: 12.5,
                y: -3.0,
                floor: 2,
                heading: 145.0,
            },
            confidence: conf,
        }
    }

    fn last_pose() -> Pose {
        Pose {
            x: 4.0,
            y: 9.0,
            lat: None,
            lng: None,
            floor: 3,
            heading: 270.0,
            confidence: 0.9,
            relocalization_needed: false,
            zone_id: Some("west-wing".into()),
        }
    }

    #[test]
    fn vps_result_is_trusted_directly() {
        let cfg = EstimatorConfig::default();
        let p = estimate(Some(&vps(Some(0.92))), Some(&last_pose()), &cfg);
        assert_eq!(p.x, 12.5);
        assert_eq!(p.y, -3.0);
        assert_eq!(p.floor, 2);
        assert_eq!(p.heading, 145.0);
        assert_eq!(p.confidence, 0.92);
        assert!(!p.relocalization_needed);
    }

    #[test]
    fn vps_without_confidence_uses_default() {
        let p = estimate(Some(&vps(None)), None, &EstimatorConfig::default());
        assert_eq!(p.confidence, 0.7);
        assert!(!p.relocalization_needed);
    }

    #[test]
    fn hold_carries_last_pose_at_low_trust() {
        let p = estimate(None, Some(&last_pose()), &EstimatorConfig::default());
        assert_eq!(p.x, 4.0);
        assert_eq!(p.y, 9.0);
        assert_eq!(p.floor, 3);
        assert_eq!(p.heading, 270.0);
        assert_eq!(p.zone_id.as_deref(), Some("west-wing"));
        assert_eq!(p.confidence, 0.5);
        assert!(p.relocalization_needed);
    }

    #[test]
    fn no_sources_starts_at_origin() {
        let p = estimate(None, None, &EstimatorConfig::default());
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.floor, 1);
        assert_eq!(p.heading, 0.0);
        assert_eq!(p.confidence, 0.5);
        assert!(p.relocalization_needed);
    }

    #[test]
    fn relocalization_flag_only_depends_on_vps_presence() {
        let with_vps = estimate(Some(&vps(Some(0.3))), Some(&last_pose()), &EstimatorConfig::default());
        assert!(!with_vps.relocalization_needed);

        let without = estimate(None, Some(&last_pose()), &EstimatorConfig::default());
        assert!(without.relocalization_needed);
    }
}
