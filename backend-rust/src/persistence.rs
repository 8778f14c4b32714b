//! Catalog snapshotting to disk. Best-effort: a missing or corrupt snapshot
//! falls back to defaults, and save failures are logged, never fatal.

use anyhow::Result;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::state::NavState;

/// Load the persisted catalogs. Returns default state if the file is missing
/// or unreadable.
pub async fn load_state(path: &str) -> NavState {
    if !Path::new(path).exists() {
        info!("No {path} found, starting with empty catalogs");
        return NavState::default();
    }

    match fs::read_to_string(path).await {
        Ok(data) => match serde_json::from_str::<NavState>(&data) {
            Ok(mut state) => {
                // Reset ephemeral runtime fields on load
                state.sessions.clear();
                state.logs.clear();
                info!(
                    "Loaded catalogs from {path} ({} geofences, {} POIs)",
                    state.geofences.len(),
                    state.pois.len()
                );
                state
            }
            Err(e) => {
                warn!("Failed to parse {path}: {e}, using default state");
                NavState::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {path}: {e}, using default state");
            NavState::default()
        }
    }
}

/// Save the persistent parts of state to disk. Strips ephemeral fields.
pub async fn save_state(path: &str, state: &NavState) -> Result<()> {
    let save = NavState {
        sessions: std::collections::HashMap::new(),
        logs: Vec::new(),
        ..state.clone()
    };

    let json = serde_json::to_string_pretty(&save)?;
    fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_types::{GeoPoint, Geofence, GeofenceKind};

    #[tokio::test]
    async fn catalogs_survive_round_trip_without_ephemera() {
        let path = std::env::temp_dir().join("waypath-persistence-test.json");
        let path = path.to_string_lossy().to_string();

        let mut state = NavState::default();
        state.geofences.push(Geofence {
            id: "b1".into(),
            name: "Block One".into(),
            kind: GeofenceKind::Building,
            polygon: vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 1.0),
                GeoPoint::new(1.0, 1.0),
            ],
            entry_points: vec![],
        });
        state.session_mut("ephemeral");

        save_state(&path, &state).await.unwrap();
        let loaded = load_state(&path).await;

        assert_eq!(loaded.geofences.len(), 1);
        assert_eq!(loaded.geofences[0].id, "b1");
        assert!(loaded.sessions.is_empty());
        assert!(loaded.logs.is_empty());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_file_yields_default_state() {
        let loaded = load_state("/nonexistent/waypath-state.json").await;
        assert!(loaded.geofences.is_empty());
        assert!(loaded.pois.is_empty());
    }
}
