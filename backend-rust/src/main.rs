mod api;
mod config;
mod error;
mod guidance_planner;
mod handlers;
mod mode_classifier;
mod persistence;
mod pipeline;
mod poi_ranker;
mod pose_estimator;
mod state;

use std::sync::Arc;
use std::time::Duration;

use socketioxide::SocketIo;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use config::{EngineConfig, ServiceConfig};
use handlers::on_connect;
use persistence::load_state;
use state::SharedState;

// ─── Session Sweeper Task ────────────────────────────────────────────────────

async fn run_session_sweeper(shared: SharedState, ttl_s: i64) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let swept = shared.write().await.sweep_sessions(ttl_s * 1000);
        if swept > 0 {
            info!("Swept {swept} idle navigation sessions");
        }
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypath_backend=info,socketioxide=warn".into()),
        )
        .init();

    info!(
        "🧭 Waypath Backend (Rust) starting at {}",
        chrono::Utc::now().to_rfc3339()
    );

    let svc = Arc::new(ServiceConfig::default());
    let engine_cfg = Arc::new(EngineConfig::default());

    // Load persisted catalogs
    let nav_state = load_state(&svc.state_file).await;
    let shared: SharedState = Arc::new(RwLock::new(nav_state));

    // Build Socket.IO layer
    let (socket_layer, io) = SocketIo::builder().build_layer();

    let shared_sock = shared.clone();
    let cfg_sock = engine_cfg.clone();
    let svc_sock = svc.clone();

    io.ns("/", move |socket: socketioxide::extract::SocketRef| {
        let shared = shared_sock.clone();
        let cfg = cfg_sock.clone();
        let svc = svc_sock.clone();
        async move {
            on_connect(socket, shared, cfg, svc).await;
        }
    });

    // Sweep idle sessions in the background
    tokio::spawn(run_session_sweeper(shared.clone(), svc.session_ttl_s));

    // CORS — allow all origins (clients are mobile webviews and dashboards)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build Axum router: HTTP operations + Socket.IO transport
    let app = api::router(shared.clone(), engine_cfg.clone())
        .layer(socket_layer)
        .layer(cors);

    let addr = format!("0.0.0.0:{}", svc.port);
    info!("🚀 Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
