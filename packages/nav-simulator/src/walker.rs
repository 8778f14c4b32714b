//! walker.rs — Synthetic pedestrian motion
//!
//! Advances a walker along the scenario's waypoint path at a noisy walking
//! pace and produces, per tick, exactly what a real client would send the
//! backend: a noisy GNSS fix, a VPS result when one would be available, and
//! the remaining route. Ground truth (actually indoors or not) rides along
//! for expectation checks — it is never sent to the backend.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

use nav_types::{
    GeoPoint, GpsFix, LocalPosition, PoseEstimate, Route, RouteStep, VpsPose,
};

use crate::scenarios::Scenario;

// Meters per degree of latitude (WGS84, mid-latitudes).
const M_PER_DEG_LAT: f64 = 111_320.0;

#[derive(Debug, Clone, Deserialize)]
pub struct WalkerConfig {
    pub speed_mps: f64,
    pub speed_variance: f64,
    pub gps_noise_sigma_m: f64,
    pub outdoor_accuracy_m: f64,
    pub indoor_accuracy_m: f64,
    pub vps_confidence: f64,
}

/// What one tick of the walk looks like from the device's point of view.
#[derive(Debug, Clone)]
pub struct WalkSample {
    pub gps: GpsFix,
    pub vps: Option<PoseEstimate>,
    pub route: Route,
    /// Ground truth, for expectation checks only.
    pub truly_indoor: bool,
    pub elapsed_s: f64,
    pub finished: bool,
}

pub struct Walker {
    scenario: Scenario,
    cfg: WalkerConfig,
    rng: StdRng,
    speed_mps: f64,
    /// Index of the waypoint currently walked toward.
    next_waypoint: usize,
    /// True position (no noise), advanced each tick.
    position: GeoPoint,
    heading: f64,
    /// Meters walked since crossing into the building.
    indoor_walked_m: f64,
    elapsed_s: f64,
    finished: bool,
}

impl Walker {
    pub fn new(scenario: Scenario, cfg: WalkerConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let speed_mps = cfg.speed_mps
            + rng.gen_range(-cfg.speed_variance..=cfg.speed_variance);
        let position = scenario.waypoints[0];
        let heading = position.bearing_to(&scenario.waypoints[1]);
        Self {
            scenario,
            cfg,
            rng,
            speed_mps,
            next_waypoint: 1,
            position,
            heading,
            indoor_walked_m: 0.0,
            elapsed_s: 0.0,
            finished: false,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Advance the walk by `dt` seconds and sample the device inputs.
    pub fn tick(&mut self, dt: f64) -> WalkSample {
        self.elapsed_s += dt;

        if !self.finished {
            self.advance(self.speed_mps * dt);
        }

        let truly_indoor = self.truly_indoor();
        let gps = self.sample_gps(truly_indoor);
        let vps = self.sample_vps(truly_indoor);
        let route = self.remaining_route();

        WalkSample {
            gps,
            vps,
            route,
            truly_indoor,
            elapsed_s: self.elapsed_s,
            finished: self.finished,
        }
    }

    fn advance(&mut self, mut step_m: f64) {
        while step_m > 0.0 {
            let Some(&target) = self.scenario.waypoints.get(self.next_waypoint) else {
                self.finished = true;
                return;
            };
            let remaining = self.position.haversine_m(&target);
            self.heading = self.position.bearing_to(&target);

            if remaining <= step_m {
                self.position = target;
                self.next_waypoint += 1;
                step_m -= remaining;
                if self.truly_indoor() {
                    self.indoor_walked_m += remaining;
                }
            } else {
                let frac = step_m / remaining;
                self.position = GeoPoint::new(
                    self.position.lat + (target.lat - self.position.lat) * frac,
                    self.position.lng + (target.lng - self.position.lng) * frac,
                );
                if self.truly_indoor() {
                    self.indoor_walked_m += step_m;
                }
                step_m = 0.0;
            }
        }
    }

    fn truly_indoor(&self) -> bool {
        self.next_waypoint > self.scenario.indoor_from
    }

    fn sample_gps(&mut self, indoor: bool) -> GpsFix {
        let sigma = self.cfg.gps_noise_sigma_m * if indoor { 2.0 } else { 1.0 };
        let noise = Normal::new(0.0, sigma).expect("valid sigma");
        let dn_m: f64 = noise.sample(&mut self.rng);
        let de_m: f64 = noise.sample(&mut self.rng);

        let lat = self.position.lat + dn_m / M_PER_DEG_LAT;
        let lng = self.position.lng
            + de_m / (M_PER_DEG_LAT * self.position.lat.to_radians().cos());

        let accuracy_m = if indoor {
            self.cfg.indoor_accuracy_m
        } else {
            self.cfg.outdoor_accuracy_m
        } + self.rng.gen_range(-2.0..2.0);

        GpsFix {
            point: GeoPoint::new(lat, lng),
            accuracy_m: accuracy_m.max(1.0),
            heading: Some(self.heading.rem_euclid(360.0)),
            speed_mps: Some(self.speed_mps),
        }
    }

    /// The VPS sees the walker once they are indoors, unless the scenario is
    /// in a dropout window.
    fn sample_vps(&mut self, indoor: bool) -> Option<PoseEstimate> {
        if !indoor || self.scenario.vps_dropped(self.elapsed_s) {
            return None;
        }
        let pose = self.indoor_pose()?;
        Some(PoseEstimate {
            pose: VpsPose {
                x: pose.x,
                y: pose.y,
                floor: pose.floor,
                heading: self.heading.rem_euclid(360.0),
            },
            confidence: Some(self.cfg.vps_confidence),
        })
    }

    /// Map meters-walked-indoors onto the scenario's local-frame path.
    fn indoor_pose(&self) -> Option<LocalPosition> {
        let path = &self.scenario.indoor_path;
        if path.is_empty() {
            return None;
        }
        let mut remaining = self.indoor_walked_m;
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let seg = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
            if remaining <= seg {
                let t = if seg > 0.0 { remaining / seg } else { 0.0 };
                return Some(LocalPosition {
                    x: a.x + (b.x - a.x) * t,
                    y: a.y + (b.y - a.y) * t,
                    floor: a.floor,
                });
            }
            remaining -= seg;
        }
        path.last().copied()
    }

    /// Route steps for the waypoints still ahead, first step measured from
    /// the walker's true position.
    fn remaining_route(&self) -> Route {
        let mut steps = Vec::new();
        let mut from = self.position;
        for &wp in &self.scenario.waypoints[self.next_waypoint.min(self.scenario.waypoints.len())..]
        {
            steps.push(RouteStep {
                distance: from.haversine_m(&wp),
                bearing: from.bearing_to(&wp),
                instruction: None,
            });
            from = wp;
        }
        Route { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::preset_approach;

    fn test_cfg() -> WalkerConfig {
        WalkerConfig {
            speed_mps: 1.4,
            speed_variance: 0.0,
            gps_noise_sigma_m: 0.0,
            outdoor_accuracy_m: 8.0,
            indoor_accuracy_m: 28.0,
            vps_confidence: 0.85,
        }
    }

    #[test]
    fn walker_starts_outdoors_without_vps() {
        let mut w = Walker::new(preset_approach(), test_cfg(), 7);
        let s = w.tick(0.5);
        assert!(!s.truly_indoor);
        assert!(s.vps.is_none());
        assert!(!s.route.steps.is_empty());
    }

    #[test]
    fn walker_eventually_enters_and_finishes() {
        let mut w = Walker::new(preset_approach(), test_cfg(), 7);
        let mut went_indoor = false;
        let mut saw_vps = false;
        for _ in 0..4000 {
            let s = w.tick(0.5);
            went_indoor |= s.truly_indoor;
            saw_vps |= s.vps.is_some();
            if s.finished {
                break;
            }
        }
        assert!(went_indoor, "walker never entered the building");
        assert!(saw_vps, "VPS never produced a fix indoors");
        assert!(w.finished);
    }

    #[test]
    fn route_shrinks_as_waypoints_pass() {
        let mut w = Walker::new(preset_approach(), test_cfg(), 7);
        let first = w.tick(0.1).route.steps.len();
        for _ in 0..600 {
            w.tick(0.5);
        }
        let later = w.tick(0.1).route.steps.len();
        assert!(later < first);
    }

    #[test]
    fn dropout_window_suppresses_vps() {
        let mut scenario = preset_approach();
        scenario.vps_dropout_windows = vec![(0.0, 1e9)];
        let mut w = Walker::new(scenario, test_cfg(), 7);
        for _ in 0..2000 {
            let s = w.tick(0.5);
            assert!(s.vps.is_none());
            if s.finished {
                break;
            }
        }
    }
}
