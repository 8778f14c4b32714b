//! Engine and service configuration.
//!
//! Every tuning constant of the four pipeline stages lives here as a named
//! field with a documented default, so policy changes never touch algorithm
//! code. Service-level knobs (port, state file) are overridable via
//! environment variables.

/// Stage 1 — mode classifier constants.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Confidence of the OUTDOOR default when no geofence matches (default 0.5)
    pub outdoor_default_confidence: f64,
    /// Confidence when inside a building / indoor zone (default 0.8)
    pub indoor_confidence: f64,
    /// Confidence when inside an outdoor transition area (default 0.6)
    pub transition_confidence: f64,
    /// Accuracy radius above which a fix counts as coarse, meters (default 20)
    pub coarse_accuracy_m: f64,
    /// Confidence boost applied to coarse fixes, capped at 1.0 (default 0.1).
    /// A degraded fix weakens the negative outdoor default, so the geofence
    /// verdict is trusted slightly more.
    pub coarse_accuracy_boost: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            outdoor_default_confidence: 0.5,
            indoor_confidence: 0.8,
            transition_confidence: 0.6,
            coarse_accuracy_m: 20.0,
            coarse_accuracy_boost: 0.1,
        }
    }
}

/// Stage 2 — pose estimator constants.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Confidence assumed for a VPS result that reports none (default 0.7)
    pub vps_default_confidence: f64,
    /// Fixed low-trust confidence of the dead-reckoning hold (default 0.5)
    pub dead_reckoning_confidence: f64,
    /// Confidence of a GPS-backed outdoor pose in the full tick (default 0.8)
    pub gps_backed_confidence: f64,
    /// Floor assumed when no prior pose exists (default 1)
    pub fallback_floor: i32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            vps_default_confidence: 0.7,
            dead_reckoning_confidence: 0.5,
            gps_backed_confidence: 0.8,
            fallback_floor: 1,
        }
    }
}

/// Stage 3 — guidance planner constants.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Heading error beyond which a turn is issued, degrees, exclusive
    /// boundary (default 30)
    pub turn_threshold_deg: f64,
    /// Fixed confidence of every planned action (default 0.8)
    pub plan_confidence: f64,
    /// Final-step distance below which ARRIVED is emitted, meters (default 2)
    pub arrival_radius_m: f64,
    /// AR anchor height above ground, meters (default 1.5)
    pub anchor_height_m: f64,
    /// AR anchor forward offset, meters (default 5)
    pub anchor_ahead_m: f64,
    /// Description when the route step carries no instruction
    pub default_instruction: String,
    /// Description of the ARRIVED terminal
    pub arrival_description: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            turn_threshold_deg: 30.0,
            plan_confidence: 0.8,
            arrival_radius_m: 2.0,
            anchor_height_m: 1.5,
            anchor_ahead_m: 5.0,
            default_instruction: "직진하세요".to_string(),
            arrival_description: "목적지에 도착했습니다".to_string(),
        }
    }
}

/// Stage 4 — POI ranker constants.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// Baseline score for POIs without a catalog priority (default 0.5)
    pub default_priority: f64,
    /// Radius of the linear proximity bonus, meters (default 50)
    pub proximity_radius_m: f64,
    /// Proximity bonus at distance zero (default 0.3)
    pub proximity_weight: f64,
    /// Score floor for POIs matching a user interest category (default 0.7)
    pub interest_boost: f64,
    /// How many ranked POIs are eligible for a call-to-action (default 3)
    pub cta_count: usize,
    /// AR anchor hints are clamped to this range, meters (default 10)
    pub anchor_range_m: f64,
    /// AR anchor hint height, meters (default 1.5)
    pub anchor_height_m: f64,
    /// Result size when the request does not specify top_k (default 5)
    pub default_top_k: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            default_priority: 0.5,
            proximity_radius_m: 50.0,
            proximity_weight: 0.3,
            interest_boost: 0.7,
            cta_count: 3,
            anchor_range_m: 10.0,
            anchor_height_m: 1.5,
            default_top_k: 5,
        }
    }
}

/// All four stage configurations bundled for the pipeline.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub estimator: EstimatorConfig,
    pub planner: PlannerConfig,
    pub ranker: RankerConfig,
}

/// Service-level settings, environment-overridable.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listen port (env `PORT`, default 4000)
    pub port: u16,
    /// Catalog snapshot path (env `WAYPATH_STATE_FILE`, default state.json)
    pub state_file: String,
    /// Sessions idle longer than this are swept, seconds
    /// (env `WAYPATH_SESSION_TTL_S`, default 600)
    pub session_ttl_s: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4000),
            state_file: std::env::var("WAYPATH_STATE_FILE")
                .unwrap_or_else(|_| "state.json".to_string()),
            session_ttl_s: std::env::var("WAYPATH_SESSION_TTL_S")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
        }
    }
}
