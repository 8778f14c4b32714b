//! Stage 1 — indoor/outdoor mode classification.
//!
//! Decides OUTDOOR / INDOOR / TRANSITION from a GNSS fix and the geofence
//! catalog. The catalog is scanned in caller order and the first containing
//! geofence wins, so providers must pass the most specific regions first
//! (ascending polygon area is the recommended ordering).

use nav_types::{Geofence, GeofenceKind, GpsFix, ModeDecision, TravelMode};

use crate::config::ClassifierConfig;

/// Classify the current travel mode.
///
/// Never fails: an empty catalog, or a fix outside every fence, yields the
/// OUTDOOR default. Degenerate polygons (< 3 vertices) match nothing.
pub fn classify(gps: &GpsFix, geofences: &[Geofence], cfg: &ClassifierConfig) -> ModeDecision {
    let mut mode = TravelMode::Outdoor;
    let mut confidence = cfg.outdoor_default_confidence;
    let mut entry_point_id = None;

    for fence in geofences {
        if !fence.contains(&gps.point) {
            continue;
        }
        match fence.kind {
            GeofenceKind::Building | GeofenceKind::IndoorZone => {
                mode = TravelMode::Indoor;
                confidence = cfg.indoor_confidence;
            }
            GeofenceKind::OutdoorArea => {
                mode = TravelMode::Transition;
                confidence = cfg.transition_confidence;
            }
        }
        entry_point_id = fence
            .nearest_entry_point(&gps.point)
            .map(|ep| ep.id.clone());
        break;
    }

    // A coarse fix weakens the negative outdoor default, so whatever was
    // decided above is trusted slightly more.
    if gps.accuracy_m > cfg.coarse_accuracy_m {
        confidence = (confidence + cfg.coarse_accuracy_boost).min(1.0);
    }

    ModeDecision {
        mode,
        confidence,
        entry_point_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_types::{EntryPoint, GeoPoint};

    fn fix(lat: f64, lng: f64, accuracy_m: f64) -> GpsFix {
        GpsFix {
            point: GeoPoint::new(lat, lng),
            accuracy_m,
            heading: None,
            speed_mps: None,
        }
    }

    fn fence(id: &str, kind: GeofenceKind, polygon: Vec<GeoPoint>) -> Geofence {
        Geofence {
            id: id.into(),
            name: id.into(),
            kind,
            polygon,
            entry_points: vec![],
        }
    }

    fn unit_square(id: &str, kind: GeofenceKind) -> Geofence {
        fence(
            id,
            kind,
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
        )
    }

    #[test]
    fn empty_catalog_defaults_outdoor() {
        let d = classify(&fix(5.0, 5.0, 10.0), &[], &ClassifierConfig::default());
        assert_eq!(d.mode, TravelMode::Outdoor);
        assert_eq!(d.confidence, 0.5);
        assert!(d.entry_point_id.is_none());
    }

    #[test]
    fn building_yields_indoor() {
        let fences = [unit_square("b1", GeofenceKind::Building)];
        let d = classify(&fix(5.0, 5.0, 10.0), &fences, &ClassifierConfig::default());
        assert_eq!(d.mode, TravelMode::Indoor);
        assert_eq!(d.confidence, 0.8);
    }

    #[test]
    fn indoor_zone_also_yields_indoor() {
        let fences = [unit_square("z1", GeofenceKind::IndoorZone)];
        let d = classify(&fix(5.0, 5.0, 10.0), &fences, &ClassifierConfig::default());
        assert_eq!(d.mode, TravelMode::Indoor);
    }

    #[test]
    fn outdoor_area_yields_transition() {
        let fences = [unit_square("plaza", GeofenceKind::OutdoorArea)];
        let d = classify(&fix(5.0, 5.0, 10.0), &fences, &ClassifierConfig::default());
        assert_eq!(d.mode, TravelMode::Transition);
        assert_eq!(d.confidence, 0.6);
    }

    #[test]
    fn first_match_wins_in_catalog_order() {
        let fences = [
            unit_square("plaza", GeofenceKind::OutdoorArea),
            unit_square("b1", GeofenceKind::Building),
        ];
        let d = classify(&fix(5.0, 5.0, 10.0), &fences, &ClassifierConfig::default());
        assert_eq!(d.mode, TravelMode::Transition);
    }

    #[test]
    fn fix_outside_all_fences_stays_outdoor() {
        let fences = [unit_square("b1", GeofenceKind::Building)];
        let d = classify(&fix(15.0, 15.0, 10.0), &fences, &ClassifierConfig::default());
        assert_eq!(d.mode, TravelMode::Outdoor);
    }

    #[test]
    fn coarse_fix_boosts_confidence() {
        let fences = [unit_square("b1", GeofenceKind::Building)];
        let d = classify(&fix(5.0, 5.0, 25.0), &fences, &ClassifierConfig::default());
        assert!((d.confidence - 0.9).abs() < 1e-9);

        // Boost also applies to the outdoor default.
        let d = classify(&fix(15.0, 15.0, 25.0), &[], &ClassifierConfig::default());
        assert!((d.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn coarse_boost_caps_at_one() {
        let cfg = ClassifierConfig {
            indoor_confidence: 0.95,
            ..ClassifierConfig::default()
        };
        let fences = [unit_square("b1", GeofenceKind::Building)];
        let d = classify(&fix(5.0, 5.0, 25.0), &fences, &cfg);
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn boundary_accuracy_is_not_coarse() {
        let fences = [unit_square("b1", GeofenceKind::Building)];
        let d = classify(&fix(5.0, 5.0, 20.0), &fences, &ClassifierConfig::default());
        assert_eq!(d.confidence, 0.8);
    }

    #[test]
    fn nearest_entry_point_is_reported() {
        let mut f = unit_square("b1", GeofenceKind::Building);
        f.entry_points = vec![
            EntryPoint {
                id: "north".into(),
                position: GeoPoint::new(10.0, 5.0),
                floor: None,
                name: None,
            },
            EntryPoint {
                id: "south".into(),
                position: GeoPoint::new(0.0, 5.0),
                floor: Some(1),
                name: None,
            },
        ];
        let d = classify(&fix(1.0, 5.0, 10.0), &[f], &ClassifierConfig::default());
        assert_eq!(d.entry_point_id.as_deref(), Some("south"));
    }

    #[test]
    fn degenerate_polygon_never_matches() {
        let fences = [fence(
            "line",
            GeofenceKind::Building,
            vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 10.0)],
        )];
        let d = classify(&fix(0.0, 5.0, 10.0), &fences, &ClassifierConfig::default());
        assert_eq!(d.mode, TravelMode::Outdoor);
    }

    #[test]
    fn gangnam_building_scenario() {
        // Building square around the Gangnam test block.
        let fences = [fence(
            "gangnam",
            GeofenceKind::Building,
            vec![
                GeoPoint::new(37.4975, 127.0270),
                GeoPoint::new(37.4975, 127.0285),
                GeoPoint::new(37.4985, 127.0285),
                GeoPoint::new(37.4985, 127.0270),
            ],
        )];
        let d = classify(
            &fix(37.4979, 127.0276, 10.0),
            &fences,
            &ClassifierConfig::default(),
        );
        assert_eq!(d.mode, TravelMode::Indoor);
        assert_eq!(d.confidence, 0.8);
    }
}
