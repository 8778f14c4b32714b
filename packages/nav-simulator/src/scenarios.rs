//! scenarios.rs — Scripted walk scenarios for the navigation simulator
//!
//! Each scenario is a complete world: geofence catalog, POI catalog, a
//! waypoint path for the walker, and the expectations the run is checked
//! against. Scenarios are selectable from the CLI.

use nav_types::{
    EntryPoint, GeoPoint, Geofence, GeofenceKind, LocalPosition, PoiKind, PoiRecord, PositionRef,
    UserGoal,
};

/// One scripted walk.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub geofences: Vec<Geofence>,
    pub pois: Vec<PoiRecord>,
    /// Outdoor path; the walker follows these in order.
    pub waypoints: Vec<GeoPoint>,
    /// Waypoint index from which the walker is inside the building
    /// (ground truth for mode expectations).
    pub indoor_from: usize,
    /// Indoor path in the building's local frame, walked after entry.
    pub indoor_path: Vec<LocalPosition>,
    /// Elapsed-time windows (seconds) during which the simulated VPS
    /// produces nothing — the engine must flag relocalization.
    pub vps_dropout_windows: Vec<(f64, f64)>,
    pub goal: Option<UserGoal>,
}

impl Scenario {
    pub fn vps_dropped(&self, elapsed_s: f64) -> bool {
        self.vps_dropout_windows
            .iter()
            .any(|&(from, to)| elapsed_s >= from && elapsed_s < to)
    }
}

/// The building every preset walks into — the Gangnam test block.
fn gangnam_tower() -> Geofence {
    Geofence {
        id: "gangnam-tower".into(),
        name: "Gangnam Tower".into(),
        kind: GeofenceKind::Building,
        polygon: vec![
            GeoPoint::new(37.4975, 127.0270),
            GeoPoint::new(37.4975, 127.0285),
            GeoPoint::new(37.4985, 127.0285),
            GeoPoint::new(37.4985, 127.0270),
        ],
        entry_points: vec![EntryPoint {
            id: "main-gate".into(),
            position: GeoPoint::new(37.4976, 127.0272),
            floor: Some(1),
            name: Some("정문".into()),
        }],
    }
}

/// Transition plaza in front of the tower entrance.
fn forecourt() -> Geofence {
    Geofence {
        id: "forecourt".into(),
        name: "Tower Forecourt".into(),
        kind: GeofenceKind::OutdoorArea,
        polygon: vec![
            GeoPoint::new(37.4971, 127.0267),
            GeoPoint::new(37.4971, 127.0274),
            GeoPoint::new(37.4975, 127.0274),
            GeoPoint::new(37.4975, 127.0267),
        ],
        entry_points: vec![],
    }
}

fn poi(id: &str, name: &str, kind: PoiKind, x: f64, y: f64, priority: f64) -> PoiRecord {
    PoiRecord {
        id: id.into(),
        name: name.into(),
        kind,
        position: PositionRef::Local(LocalPosition { x, y, floor: 1 }),
        priority: Some(priority),
        features: None,
    }
}

fn base_pois() -> Vec<PoiRecord> {
    vec![
        poi("cafe-1", "카페 한잔", PoiKind::Restaurant, 12.0, 8.0, 0.7),
        poi("store-1", "편의점", PoiKind::Store, 25.0, 10.0, 0.6),
        poi("exhibit-1", "미디어 아트월", PoiKind::Exhibit, 18.0, 22.0, 0.5),
        poi("wc-1", "화장실", PoiKind::Restroom, 35.0, 5.0, 0.3),
        poi("exit-east", "동문", PoiKind::Exit, 48.0, 15.0, 0.2),
    ]
}

/// Approach → enter → indoor corridor. The bread-and-butter run.
pub fn preset_approach() -> Scenario {
    Scenario {
        name: "approach",
        geofences: vec![gangnam_tower(), forecourt()],
        pois: base_pois(),
        waypoints: vec![
            GeoPoint::new(37.4965, 127.0260), // street, well outside
            GeoPoint::new(37.4972, 127.0269), // forecourt (TRANSITION)
            GeoPoint::new(37.4977, 127.0273), // through the gate (INDOOR)
            GeoPoint::new(37.4980, 127.0278), // lobby
            GeoPoint::new(37.4983, 127.0282), // east wing
        ],
        indoor_from: 2,
        indoor_path: vec![
            LocalPosition { x: 2.0, y: 2.0, floor: 1 },
            LocalPosition { x: 12.0, y: 8.0, floor: 1 },
            LocalPosition { x: 25.0, y: 14.0, floor: 1 },
            LocalPosition { x: 40.0, y: 18.0, floor: 1 },
        ],
        vps_dropout_windows: vec![],
        goal: Some(UserGoal {
            target_poi_id: Some("cafe-1".into()),
            interest_categories: None,
        }),
    }
}

/// Same walk, but the VPS goes dark mid-building. Every decision inside a
/// dropout window must carry `relocalizationNeeded: true`. The windows sit
/// in the indoor phase of the walk (entry is around t≈125s at nominal pace).
pub fn preset_vps_dropout() -> Scenario {
    Scenario {
        name: "vps_dropout",
        vps_dropout_windows: vec![(135.0, 160.0), (175.0, 185.0)],
        ..preset_approach()
    }
}

/// A dense POI floor — stresses ranking stability and the top-K cut.
pub fn preset_crowded_pois() -> Scenario {
    let mut pois = base_pois();
    for i in 0..40 {
        let kind = match i % 4 {
            0 => PoiKind::Store,
            1 => PoiKind::Restaurant,
            2 => PoiKind::Exhibit,
            _ => PoiKind::Other,
        };
        pois.push(poi(
            &format!("gen-{i}"),
            &format!("매장 {i}"),
            kind,
            (i % 8) as f64 * 6.0,
            (i / 8) as f64 * 6.0,
            0.4,
        ));
    }
    Scenario {
        name: "crowded_pois",
        pois,
        goal: Some(UserGoal {
            target_poi_id: Some("exhibit-1".into()),
            interest_categories: Some(vec![PoiKind::Restaurant]),
        }),
        ..preset_approach()
    }
}

pub fn by_name(name: &str) -> Option<Scenario> {
    match name {
        "approach" => Some(preset_approach()),
        "vps_dropout" => Some(preset_vps_dropout()),
        "crowded_pois" => Some(preset_crowded_pois()),
        _ => None,
    }
}
