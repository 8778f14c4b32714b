//! Shared service state: catalogs, per-session navigation context, log ring.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use nav_types::{Geofence, PoiRecord, Pose, Route, TravelMode, UserGoal};

pub type SharedState = Arc<RwLock<NavState>>;

/// Unix time in milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

// ─── Per-Session Context ─────────────────────────────────────────────────────

/// Navigation context the engine itself refuses to own: the engine is
/// stateless per call, so pose continuity and the active route/goal live
/// here and are fed back in on every tick.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<UserGoal>,
    /// Last indoor pose, replayed as `last_known_pose` on the next tick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pose: Option<Pose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_mode: Option<TravelMode>,
    pub updated_ms: i64,
}

// ─── Logging ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogCategory {
    Mode,     // Indoor/outdoor transitions
    Guidance, // Planned AR actions
    Poi,      // Ranking activity
    Catalog,  // Geofence/POI catalog updates
    System,   // Server-level events
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: i64,
    pub category: LogCategory,
    pub source: String, // e.g. "session-ab12", "Catalog API"
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ─── Full Service State ──────────────────────────────────────────────────────

const MAX_LOGS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    /// Geofence catalog, priority order (most specific first).
    pub geofences: Vec<Geofence>,
    /// POI catalog.
    pub pois: Vec<PoiRecord>,
    // Ephemeral — populated at runtime, not persisted
    #[serde(default)]
    pub sessions: HashMap<String, SessionContext>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl NavState {
    pub fn session_mut(&mut self, session_id: &str) -> &mut SessionContext {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionContext {
                updated_ms: now_ms(),
                ..SessionContext::default()
            })
    }

    /// Append a log entry, keeping the ring at a reasonable size.
    pub fn push_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }

    /// Drop sessions idle longer than `ttl_ms`. Returns how many were swept.
    pub fn sweep_sessions(&mut self, ttl_ms: i64) -> usize {
        let cutoff = now_ms() - ttl_ms;
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.updated_ms >= cutoff);
        before - self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_ring_is_capped() {
        let mut state = NavState::default();
        for i in 0..150 {
            state.push_log(LogEntry {
                id: format!("log-{i}"),
                timestamp: i,
                category: LogCategory::System,
                source: "test".into(),
                message: "entry".into(),
                data: None,
            });
        }
        assert_eq!(state.logs.len(), 100);
        assert_eq!(state.logs[0].id, "log-50");
    }

    #[test]
    fn session_sweep_keeps_fresh_sessions() {
        let mut state = NavState::default();
        state.session_mut("fresh");
        state.sessions.insert(
            "stale".into(),
            SessionContext {
                updated_ms: now_ms() - 10_000,
                ..SessionContext::default()
            },
        );
        let swept = state.sweep_sessions(5_000);
        assert_eq!(swept, 1);
        assert!(state.sessions.contains_key("fresh"));
        assert!(!state.sessions.contains_key("stale"));
    }
}
