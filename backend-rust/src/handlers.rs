//! Socket.IO event handlers — the live transport for client ticks and
//! catalog management.
//!
//! Clients `register` as a `navigator` (phone running the AR session) or an
//! `observer` (ops dashboard). Navigators stream `nav-tick` events and get a
//! `nav-decision` back each tick; observers receive every decision and log
//! entry. Malformed payloads are logged and dropped, never fatal.

use std::sync::Arc;

use serde_json::{json, Value};
use socketioxide::extract::{Data, SocketRef};
use tracing::{info, warn};
use uuid::Uuid;

use nav_types::{Geofence, PoiRecord, Route, TravelMode, UserGoal};

use crate::config::{EngineConfig, ServiceConfig};
use crate::persistence::save_state;
use crate::pipeline::{self, TickInput, TickOutput};
use crate::state::{now_ms, LogCategory, LogEntry, SharedState};

// ─── Shared Service Helpers ──────────────────────────────────────────────────

pub async fn emit_log(
    shared: &SharedState,
    socket: &SocketRef,
    category: LogCategory,
    source: String,
    message: String,
    data: Option<Value>,
) {
    let log = LogEntry {
        id: format!("log-{}", Uuid::new_v4()),
        timestamp: now_ms(),
        category,
        source,
        message,
        data,
    };

    {
        let mut state = shared.write().await;
        state.push_log(log.clone());
    }

    let _ = socket.broadcast().emit("new-log", &log);
    let _ = socket.emit("new-log", &log);
}

/// Run one pipeline tick against the shared state, maintaining session
/// continuity when a session id is present. Returns the decision plus a log
/// entry when the travel mode flipped.
///
/// Used by both transports — the HTTP `/v1/tick` operation and the
/// `nav-tick` socket event.
pub async fn run_session_tick(
    shared: &SharedState,
    cfg: &EngineConfig,
    session_id: Option<&str>,
    input: &TickInput,
) -> (TickOutput, Option<LogEntry>) {
    let (output, prev_mode) = {
        let state = shared.read().await;
        let session = session_id.and_then(|sid| state.sessions.get(sid));
        let last_pose = session.and_then(|s| s.last_pose.clone());
        let prev_mode = session.and_then(|s| s.last_mode);

        let geofences = input.geofences.as_deref().unwrap_or(&state.geofences);
        let pois = match input.pois.as_deref() {
            Some(p) => Some(p),
            None if !state.pois.is_empty() => Some(state.pois.as_slice()),
            None => None,
        };

        (
            pipeline::run_tick(input, geofences, pois, last_pose.as_ref(), cfg),
            prev_mode,
        )
    };

    let mut mode_log = None;
    if let Some(sid) = session_id {
        let mut state = shared.write().await;
        let session = state.session_mut(sid);
        if output.mode.mode == TravelMode::Indoor {
            session.last_pose = Some(output.pose.clone());
        }
        session.last_mode = Some(output.mode.mode);
        session.updated_ms = now_ms();

        if prev_mode.is_some() && prev_mode != Some(output.mode.mode) {
            let log = LogEntry {
                id: format!("log-{}", Uuid::new_v4()),
                timestamp: now_ms(),
                category: LogCategory::Mode,
                source: sid.to_string(),
                message: format!("Mode changed to {:?}", output.mode.mode),
                data: Some(json!({
                    "confidence": output.mode.confidence,
                    "entryPointId": output.mode.entry_point_id,
                })),
            };
            state.push_log(log.clone());
            mode_log = Some(log);
        }
    }

    (output, mode_log)
}

// ─── Main Connection Handler ─────────────────────────────────────────────────

pub async fn on_connect(
    socket: SocketRef,
    shared: SharedState,
    cfg: Arc<EngineConfig>,
    svc: Arc<ServiceConfig>,
) {
    let socket_id = socket.id.to_string();
    info!("Client connected: {socket_id}");

    // ── register ──────────────────────────────────────────────────────────
    {
        let socket = socket.clone();
        let shared = shared.clone();
        socket.on("register", move |s: SocketRef, Data::<Value>(data)| {
            let shared = shared.clone();
            async move {
                let client_type = match data["type"].as_str().unwrap_or("navigator") {
                    "observer" => "observer",
                    _ => "navigator",
                };
                info!("Client {}: registered as {client_type}", s.id);
                let _ = s.join(client_type.to_string());

                let state = shared.read().await;
                let _ = s.emit("init-state", &*state);
            }
        });
    }

    // ── latency-ping ──────────────────────────────────────────────────────
    {
        let socket = socket.clone();
        socket.on("latency-ping", move |s: SocketRef, Data::<Value>(data)| {
            async move {
                let _ = s.emit("latency-pong", &data);
            }
        });
    }

    // ── nav-tick ──────────────────────────────────────────────────────────
    {
        let socket = socket.clone();
        let shared = shared.clone();
        let cfg = cfg.clone();
        socket.on("nav-tick", move |s: SocketRef, Data::<Value>(data)| {
            let shared = shared.clone();
            let cfg = cfg.clone();
            async move {
                // Sessions default to the socket id so a bare client still
                // gets pose continuity.
                let session_id = data["sessionId"]
                    .as_str()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| s.id.to_string());

                let input = match serde_json::from_value::<TickInput>(data) {
                    Ok(input) => input,
                    Err(e) => {
                        warn!("Failed to parse nav-tick payload: {e}");
                        let _ = s.emit("nav-error", &json!({ "error": e.to_string() }));
                        return;
                    }
                };

                // Fill in the session's stored route/goal when the tick
                // does not carry its own.
                let input = {
                    let state = shared.read().await;
                    match state.sessions.get(&session_id) {
                        Some(session) => TickInput {
                            route: input.route.or_else(|| session.route.clone()),
                            user_goal: input.user_goal.or_else(|| session.goal.clone()),
                            ..input
                        },
                        None => input,
                    }
                };

                let (output, mode_log) =
                    run_session_tick(&shared, &cfg, Some(&session_id), &input).await;

                let _ = s.emit("nav-decision", &output);
                let _ = s.to("observer").emit("nav-decision", &output);
                if let Some(log) = mode_log {
                    let _ = s.broadcast().emit("new-log", &log);
                    let _ = s.emit("new-log", &log);
                }
            }
        });
    }

    // ── update-geofences ──────────────────────────────────────────────────
    {
        let socket = socket.clone();
        let shared = shared.clone();
        let svc = svc.clone();
        socket.on("update-geofences", move |s: SocketRef, Data::<Value>(data)| {
            let shared = shared.clone();
            let svc = svc.clone();
            async move {
                match serde_json::from_value::<Vec<Geofence>>(data.clone()) {
                    Ok(geofences) => {
                        let count = geofences.len();
                        {
                            let mut state = shared.write().await;
                            state.geofences = geofences;
                            if let Err(e) = save_state(&svc.state_file, &state).await {
                                warn!("Failed to persist catalogs: {e}");
                            }
                        }
                        let payload = json!({ "geofences": count });
                        let _ = s.broadcast().emit("catalog-updated", &payload);
                        let _ = s.emit("catalog-updated", &payload);

                        emit_log(&shared, &s, LogCategory::Catalog, "Catalog API".to_string(),
                            format!("Geofence catalog replaced ({count} fences)"), None).await;
                    }
                    Err(e) => warn!("Failed to parse geofence catalog: {e} | Raw Data: {data}"),
                }
            }
        });
    }

    // ── update-pois ───────────────────────────────────────────────────────
    {
        let socket = socket.clone();
        let shared = shared.clone();
        let svc = svc.clone();
        socket.on("update-pois", move |s: SocketRef, Data::<Value>(data)| {
            let shared = shared.clone();
            let svc = svc.clone();
            async move {
                match serde_json::from_value::<Vec<PoiRecord>>(data.clone()) {
                    Ok(pois) => {
                        let count = pois.len();
                        {
                            let mut state = shared.write().await;
                            state.pois = pois;
                            if let Err(e) = save_state(&svc.state_file, &state).await {
                                warn!("Failed to persist catalogs: {e}");
                            }
                        }
                        let payload = json!({ "pois": count });
                        let _ = s.broadcast().emit("catalog-updated", &payload);
                        let _ = s.emit("catalog-updated", &payload);

                        emit_log(&shared, &s, LogCategory::Catalog, "Catalog API".to_string(),
                            format!("POI catalog replaced ({count} POIs)"), None).await;
                    }
                    Err(e) => warn!("Failed to parse POI catalog: {e} | Raw Data: {data}"),
                }
            }
        });
    }

    // ── set-route ─────────────────────────────────────────────────────────
    {
        let socket = socket.clone();
        let shared = shared.clone();
        socket.on("set-route", move |s: SocketRef, Data::<Value>(data)| {
            let shared = shared.clone();
            async move {
                let session_id = data["sessionId"]
                    .as_str()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| s.id.to_string());
                match serde_json::from_value::<Route>(data["route"].clone()) {
                    Ok(route) => {
                        let steps = route.steps.len();
                        let mut state = shared.write().await;
                        let session = state.session_mut(&session_id);
                        session.route = Some(route);
                        session.updated_ms = now_ms();
                        info!("Session {session_id}: route set ({steps} steps)");
                    }
                    Err(e) => warn!("Failed to parse route: {e}"),
                }
            }
        });
    }

    // ── set-goal ──────────────────────────────────────────────────────────
    {
        let socket = socket.clone();
        let shared = shared.clone();
        socket.on("set-goal", move |s: SocketRef, Data::<Value>(data)| {
            let shared = shared.clone();
            async move {
                let session_id = data["sessionId"]
                    .as_str()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| s.id.to_string());
                match serde_json::from_value::<UserGoal>(data["goal"].clone()) {
                    Ok(goal) => {
                        let mut state = shared.write().await;
                        let session = state.session_mut(&session_id);
                        session.goal = Some(goal);
                        session.updated_ms = now_ms();
                        info!("Session {session_id}: goal updated");
                    }
                    Err(e) => warn!("Failed to parse goal: {e}"),
                }
            }
        });
    }

    // ── clear-session ─────────────────────────────────────────────────────
    {
        let socket = socket.clone();
        let shared = shared.clone();
        socket.on("clear-session", move |s: SocketRef, Data::<Value>(data)| {
            let shared = shared.clone();
            async move {
                let session_id = data["sessionId"]
                    .as_str()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| s.id.to_string());
                let removed = shared.write().await.sessions.remove(&session_id).is_some();
                if removed {
                    info!("Session {session_id} cleared");
                }
            }
        });
    }

    info!("All handlers registered for socket {socket_id}");
}
