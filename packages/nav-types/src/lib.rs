//! # nav-types
//!
//! Shared data model for the Waypath AR pedestrian-navigation suite.
//!
//! These types are used by:
//! - `backend-rust`: the four-stage decision engine and its HTTP/Socket.IO service
//! - `packages/nav-simulator`: synthetic pedestrian walker driving the backend
//!
//! ## Coordinate Conventions
//!
//! - **Geo frame**: WGS84 degrees (`lat`/`lng`). Outdoor geometry; polygon
//!   containment treats lng as x and lat as y.
//! - **Local frame**: meters in a floor-local Cartesian frame (`x`/`y`) plus an
//!   integer floor index. Indoor geometry.
//! - **AR anchor frame**: meters relative to the device camera — x = right,
//!   y = up, z = forward.
//!
//! ## Invariants
//! - Every entity is an immutable snapshot; pipeline stages return fresh values
//!   and never mutate their inputs.
//! - A geofence polygon needs ≥ 3 vertices; the ring is implicitly closed
//!   (last vertex connects back to the first).
//! - Headings and bearings are degrees in [0, 360); confidences in [0, 1].

use serde::{Deserialize, Serialize};

// ── Geometry Primitives ───────────────────────────────────────────────────────

/// Mean Earth radius, meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 position, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn haversine_m(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.lng - self.lng).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Initial bearing from self to `other`, degrees in [0, 360).
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_lambda = (other.lng - self.lng).to_radians();

        let y = d_lambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
        y.atan2(x).to_degrees().rem_euclid(360.0)
    }
}

/// Floor-local 2D position, meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

impl LocalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other` in meters.
    pub fn distance_m(&self, other: &LocalPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Normalize an angle difference to [-180, 180) degrees.
pub fn normalize_deg_180(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

// ── Geofences ─────────────────────────────────────────────────────────────────

/// Semantic class of a geofenced region — drives the mode decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeofenceKind {
    /// Roofed structure — GPS degrades inside, mode flips to INDOOR
    Building,
    /// Mapped indoor zone (mall wing, concourse) — also INDOOR
    IndoorZone,
    /// Open area adjacent to an entrance — TRANSITION buffer
    OutdoorArea,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    pub id: String,
    pub position: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A named polygonal region that triggers mode transitions.
///
/// The polygon ring is implicitly closed. Catalog order is a caller contract:
/// geofences are scanned first-match-wins, so providers must order them most
/// specific first (e.g. ascending polygon area).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GeofenceKind,
    pub polygon: Vec<GeoPoint>,
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
}

impl Geofence {
    /// Even-odd ray-casting containment test over the polygon ring, treating
    /// lng as x and lat as y.
    ///
    /// Boundary rule: the strict comparisons of the classic algorithm give a
    /// half-open result — a point exactly on a left/bottom edge tests inside,
    /// on a right/top edge outside. Deterministic either way.
    ///
    /// A ring with fewer than 3 vertices contains nothing.
    pub fn contains(&self, p: &GeoPoint) -> bool {
        let ring = &self.polygon;
        if ring.len() < 3 {
            return false;
        }

        let mut inside = false;
        for i in 0..ring.len() {
            let j = (i + 1) % ring.len();
            let (xi, yi) = (ring[i].lng, ring[i].lat);
            let (xj, yj) = (ring[j].lng, ring[j].lat);

            let crosses = (yi > p.lat) != (yj > p.lat)
                && p.lng < (xj - xi) * (p.lat - yi) / (yj - yi) + xi;
            if crosses {
                inside = !inside;
            }
        }
        inside
    }

    /// Entry point closest to `p` by great-circle distance.
    pub fn nearest_entry_point(&self, p: &GeoPoint) -> Option<&EntryPoint> {
        self.entry_points.iter().min_by(|a, b| {
            let da = p.haversine_m(&a.position);
            let db = p.haversine_m(&b.position);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

// ── GPS Fix ───────────────────────────────────────────────────────────────────

/// One raw GNSS fix as delivered by the client device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsFix {
    pub point: GeoPoint,
    /// Reported horizontal accuracy radius, meters.
    pub accuracy_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
}

// ── Mode Decision ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Outdoor,
    Indoor,
    Transition,
}

/// Output of the mode classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDecision {
    pub mode: TravelMode,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point_id: Option<String>,
}

// ── Pose ──────────────────────────────────────────────────────────────────────

/// Estimated user pose. Local-frame `x`/`y` are always populated; `lat`/`lng`
/// are carried when the pose is GPS-backed so geo-frame POIs stay rankable.
///
/// A pose is produced fresh each call and replaces the previous one; the
/// engine never mutates a pose in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    pub floor: i32,
    /// Degrees in [0, 360).
    pub heading: f64,
    pub confidence: f64,
    pub relocalization_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

impl Pose {
    /// Frame-matched distance from this pose to a POI position, meters.
    ///
    /// Local positions measure against `x`/`y` (floor is not gated here — the
    /// proximity policy is planar); geo positions need the pose to carry
    /// `lat`/`lng`. `None` when the frames cannot be matched.
    pub fn distance_to(&self, position: &PositionRef) -> Option<f64> {
        match position {
            PositionRef::Local(lp) => {
                Some(LocalPoint::new(self.x, self.y).distance_m(&LocalPoint::new(lp.x, lp.y)))
            }
            PositionRef::Geo(gp) => {
                let (lat, lng) = (self.lat?, self.lng?);
                Some(GeoPoint::new(lat, lng).haversine_m(gp))
            }
        }
    }

    /// Planar displacement (dx, dy) from the pose to a POI position in the
    /// pose's own frame. Geo positions are projected onto a local tangent
    /// plane around the pose. `None` when the frames cannot be matched.
    pub fn displacement_to(&self, position: &PositionRef) -> Option<(f64, f64)> {
        match position {
            PositionRef::Local(lp) => Some((lp.x - self.x, lp.y - self.y)),
            PositionRef::Geo(gp) => {
                let (lat, lng) = (self.lat?, self.lng?);
                let dy = (gp.lat - lat).to_radians() * EARTH_RADIUS_M;
                let dx = (gp.lng - lng).to_radians() * EARTH_RADIUS_M * lat.to_radians().cos();
                Some((dx, dy))
            }
        }
    }
}

/// Pose fields reported by the external visual positioning system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpsPose {
    pub x: f64,
    pub y: f64,
    pub floor: i32,
    pub heading: f64,
}

/// Visual-positioning result. `confidence` defaults engine-side when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseEstimate {
    pub pose: VpsPose,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// One leg of a walking route. The first step of a route is the current one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    /// Remaining length of this leg, meters (≥ 0).
    pub distance: f64,
    /// Leg direction, degrees in [0, 360).
    pub bearing: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub steps: Vec<RouteStep>,
}

// ── Guidance ──────────────────────────────────────────────────────────────────

/// Discrete AR action surfaced to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArAction {
    GoStraight,
    TurnLeft,
    TurnRight,
    /// Logical terminal: final step reached within the arrival radius.
    Arrived,
}

/// Device-relative AR anchor offset, meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArAnchor {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Output of the guidance planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceAction {
    pub action: ArAction,
    pub distance_to_action: f64,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<ArAnchor>,
    pub description: String,
}

// ── POIs ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoiKind {
    Store,
    Restaurant,
    Exhibit,
    Restroom,
    Exit,
    Escalator,
    Elevator,
    Other,
}

/// Floor-local POI position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalPosition {
    pub x: f64,
    pub y: f64,
    pub floor: i32,
}

/// POI position in either coordinate frame. Untagged on the wire: geo
/// positions carry `lat`/`lng`, local positions `x`/`y`/`floor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionRef {
    Local(LocalPosition),
    Geo(GeoPoint),
}

impl PositionRef {
    pub fn floor(&self) -> Option<i32> {
        match self {
            PositionRef::Local(lp) => Some(lp.floor),
            PositionRef::Geo(_) => None,
        }
    }
}

/// Catalog entry. The ranker reads these and emits scored copies — the
/// catalog itself is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PoiKind,
    pub position: PositionRef,
    /// Baseline weight in [0, 1]; engine default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<f32>>,
}

/// What the user is currently trying to reach or browse.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserGoal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_poi_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_categories: Option<Vec<PoiKind>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaKind {
    Navigate,
    Enter,
    ViewInfo,
}

/// UI hint suggesting an action for a ranked POI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToAction {
    #[serde(rename = "type")]
    pub kind: CtaKind,
    pub poi_id: String,
    pub label: String,
}

/// Scored copy of a catalog POI, ready for AR surfacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPoi {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PoiKind,
    pub position: PositionRef,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_hint: Option<ArAnchor>,
}

/// Output of the POI ranker. `cta` is `None` rather than an empty list when
/// no ranked POI produces a call-to-action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiRanking {
    pub top_pois: Vec<RankedPoi>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta: Option<Vec<CallToAction>>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn square_fence() -> Geofence {
        Geofence {
            id: "sq".into(),
            name: "Square".into(),
            kind: GeofenceKind::Building,
            polygon: vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
            entry_points: vec![],
        }
    }

    #[test]
    fn square_contains_center_excludes_outside() {
        let fence = square_fence();
        assert!(fence.contains(&GeoPoint::new(5.0, 5.0)));
        assert!(!fence.contains(&GeoPoint::new(15.0, 15.0)));
        assert!(!fence.contains(&GeoPoint::new(-1.0, 5.0)));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let mut fence = square_fence();
        fence.polygon.truncate(2);
        assert!(!fence.contains(&GeoPoint::new(0.0, 0.0)));
        fence.polygon.clear();
        assert!(!fence.contains(&GeoPoint::new(5.0, 5.0)));
    }

    #[test]
    fn nearest_entry_point_picks_closest() {
        let mut fence = square_fence();
        fence.entry_points = vec![
            EntryPoint {
                id: "far".into(),
                position: GeoPoint::new(10.0, 10.0),
                floor: None,
                name: None,
            },
            EntryPoint {
                id: "near".into(),
                position: GeoPoint::new(1.0, 1.0),
                floor: Some(1),
                name: None,
            },
        ];
        let nearest = fence.nearest_entry_point(&GeoPoint::new(0.5, 0.5)).unwrap();
        assert_eq!(nearest.id, "near");
    }

    #[test]
    fn normalize_wraps_into_half_open_range() {
        assert_eq!(normalize_deg_180(0.0), 0.0);
        assert_eq!(normalize_deg_180(190.0), -170.0);
        assert_eq!(normalize_deg_180(-190.0), 170.0);
        assert_eq!(normalize_deg_180(360.0), 0.0);
        assert_eq!(normalize_deg_180(180.0), -180.0);
        assert_eq!(normalize_deg_180(540.0), -180.0);
    }

    #[test]
    fn haversine_known_distance() {
        // One degree of latitude ≈ 111.19 km at the equator.
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = a.haversine_m(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!((origin.bearing_to(&GeoPoint::new(1.0, 0.0)) - 0.0).abs() < 1e-6);
        assert!((origin.bearing_to(&GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-6);
        assert!((origin.bearing_to(&GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 1e-6);
    }

    #[test]
    fn pose_distance_matches_frames() {
        let pose = Pose {
            x: 3.0,
            y: 4.0,
            lat: Some(37.0),
            lng: Some(127.0),
            floor: 1,
            heading: 0.0,
            confidence: 0.9,
            relocalization_needed: false,
            zone_id: None,
        };
        let local = PositionRef::Local(LocalPosition { x: 0.0, y: 0.0, floor: 1 });
        assert!((pose.distance_to(&local).unwrap() - 5.0).abs() < 1e-9);

        let geo = PositionRef::Geo(GeoPoint::new(37.0, 127.0));
        assert!(pose.distance_to(&geo).unwrap() < 1e-6);

        let no_geo = Pose { lat: None, lng: None, ..pose };
        assert!(no_geo.distance_to(&geo).is_none());
    }

    #[test]
    fn position_ref_wire_shapes() {
        let local: PositionRef =
            serde_json::from_str(r#"{"x": 1.0, "y": 2.0, "floor": 3}"#).unwrap();
        assert!(matches!(local, PositionRef::Local(_)));

        let geo: PositionRef = serde_json::from_str(r#"{"lat": 37.5, "lng": 127.0}"#).unwrap();
        assert!(matches!(geo, PositionRef::Geo(_)));
    }
}
