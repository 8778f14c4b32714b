//! Stage 3 — route step to AR action.
//!
//! Looks only at the immediate next route step (no multi-step lookahead) and
//! turns the bearing error against the current heading into a discrete
//! action. The AR anchor is a fixed device-relative offset — a stand-in
//! until real 3D anchor projection replaces it.

use nav_types::{normalize_deg_180, ArAction, ArAnchor, GuidanceAction, Pose, Route};

use crate::config::PlannerConfig;
use crate::error::{EngineError, Result};

/// Plan the next AR action for `route` from `pose`.
///
/// The only hard engine failure: an empty route is `EngineError::InvalidRoute`.
pub fn plan(route: &Route, pose: &Pose, cfg: &PlannerConfig) -> Result<GuidanceAction> {
    let first = route.steps.first().ok_or(EngineError::InvalidRoute)?;

    // Terminal: the route is down to its final step and it is within reach.
    if route.steps.len() == 1 && first.distance <= cfg.arrival_radius_m {
        return Ok(GuidanceAction {
            action: ArAction::Arrived,
            distance_to_action: first.distance,
            confidence: cfg.plan_confidence,
            anchor: Some(anchor(cfg)),
            description: cfg.arrival_description.clone(),
        });
    }

    let angle_diff = normalize_deg_180(first.bearing - pose.heading);
    let action = if angle_diff.abs() > cfg.turn_threshold_deg {
        if angle_diff > 0.0 {
            ArAction::TurnRight
        } else {
            ArAction::TurnLeft
        }
    } else {
        ArAction::GoStraight
    };

    Ok(GuidanceAction {
        action,
        distance_to_action: first.distance,
        confidence: cfg.plan_confidence,
        anchor: Some(anchor(cfg)),
        description: first
            .instruction
            .clone()
            .unwrap_or_else(|| cfg.default_instruction.clone()),
    })
}

fn anchor(cfg: &PlannerConfig) -> ArAnchor {
    ArAnchor {
        x: 0.0,
        y: cfg.anchor_height_m,
        z: cfg.anchor_ahead_m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_types::RouteStep;

    fn pose(heading: f64) -> Pose {
        Pose {
            x: 0.0,
            y: 0.0,
            lat: None,
            lng: None,
            floor: 1,
            heading,
            confidence: 0.8,
            relocalization_needed: false,
            zone_id: None,
        }
    }

    fn route(steps: &[(f64, f64)]) -> Route {
        Route {
            steps: steps
                .iter()
                .map(|&(distance, bearing)| RouteStep {
                    distance,
                    bearing,
                    instruction: None,
                })
                .collect(),
        }
    }

    fn action_for(heading: f64, bearing: f64) -> ArAction {
        plan(&route(&[(25.0, bearing)]), &pose(heading), &PlannerConfig::default())
            .unwrap()
            .action
    }

    #[test]
    fn aligned_heading_goes_straight() {
        assert_eq!(action_for(90.0, 90.0), ArAction::GoStraight);
    }

    #[test]
    fn turn_threshold_is_exclusive() {
        assert_eq!(action_for(0.0, 29.0), ArAction::GoStraight);
        assert_eq!(action_for(0.0, 30.0), ArAction::GoStraight);
        assert_eq!(action_for(0.0, 30.01), ArAction::TurnRight);
        assert_eq!(action_for(0.0, 31.0), ArAction::TurnRight);
        assert_eq!(action_for(0.0, 329.0), ArAction::TurnLeft);
        assert_eq!(action_for(0.0, 330.0), ArAction::GoStraight);
    }

    #[test]
    fn turns_follow_sign_of_bearing_error() {
        assert_eq!(action_for(10.0, 100.0), ArAction::TurnRight);
        assert_eq!(action_for(100.0, 10.0), ArAction::TurnLeft);
    }

    #[test]
    fn wraparound_near_north_goes_straight() {
        assert_eq!(action_for(350.0, 10.0), ArAction::GoStraight);
        assert_eq!(action_for(10.0, 350.0), ArAction::GoStraight);
    }

    #[test]
    fn empty_route_is_invalid() {
        let err = plan(&route(&[]), &pose(0.0), &PlannerConfig::default()).unwrap_err();
        assert_eq!(err, EngineError::InvalidRoute);
    }

    #[test]
    fn plan_carries_first_step_distance_and_anchor_stub() {
        let g = plan(&route(&[(42.0, 0.0), (10.0, 90.0)]), &pose(0.0), &PlannerConfig::default())
            .unwrap();
        assert_eq!(g.distance_to_action, 42.0);
        assert_eq!(g.confidence, 0.8);
        let a = g.anchor.unwrap();
        assert_eq!((a.x, a.y, a.z), (0.0, 1.5, 5.0));
    }

    #[test]
    fn instruction_defaults_when_absent() {
        let g = plan(&route(&[(5.0, 0.0), (5.0, 0.0)]), &pose(0.0), &PlannerConfig::default())
            .unwrap();
        assert_eq!(g.description, "직진하세요");

        let mut r = route(&[(5.0, 0.0), (5.0, 0.0)]);
        r.steps[0].instruction = Some("복도를 따라 직진".into());
        let g = plan(&r, &pose(0.0), &PlannerConfig::default()).unwrap();
        assert_eq!(g.description, "복도를 따라 직진");
    }

    #[test]
    fn final_step_within_radius_arrives() {
        let g = plan(&route(&[(1.5, 120.0)]), &pose(0.0), &PlannerConfig::default()).unwrap();
        assert_eq!(g.action, ArAction::Arrived);
        assert_eq!(g.distance_to_action, 1.5);
    }

    #[test]
    fn arrival_needs_a_single_remaining_step() {
        // Same short distance, but more steps remain — keep guiding.
        let g = plan(&route(&[(1.5, 0.0), (30.0, 90.0)]), &pose(0.0), &PlannerConfig::default())
            .unwrap();
        assert_eq!(g.action, ArAction::GoStraight);
    }
}
