//! main.rs — Waypath navigation simulator entry point
//!
//! Walks a synthetic pedestrian through a scripted scenario and drives the
//! backend's `/v1/tick` operation with exactly the JSON a real client would
//! send, at a configurable rate. Every decision that comes back is checked
//! against the scenario's ground truth:
//!   - mode must be INDOOR once the walker is inside the building
//!   - decisions during a VPS dropout must flag relocalization
//!   - POI rankings must respect top-K and be sorted non-increasing
//!
//! The run ends when the walk does, with a pass/fail summary.

mod scenarios;
mod walker;

use std::time::Duration;

use clap::Parser;
use serde_json::{json, Value};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use walker::{WalkSample, Walker, WalkerConfig};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "nav-sim", about = "Waypath synthetic pedestrian simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Backend base URL
    #[arg(long, default_value = "http://127.0.0.1:4000")]
    backend: String,
    /// Scenario: approach | vps_dropout | crowded_pois
    #[arg(long, default_value = "approach")]
    scenario: String,
    /// Simulation speed multiplier (1.0 = real-time)
    #[arg(long, default_value = "1.0")]
    speed: f64,
    /// RNG seed for reproducible walks
    #[arg(long, default_value = "42")]
    seed: u64,
    /// Stop after this many ticks even if the walk is unfinished
    #[arg(long, default_value = "2000")]
    max_ticks: u64,
}

// ── Config structs ────────────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct FullConfig {
    walker: WalkerConfig,
    run: RunConfig,
}

#[derive(Debug, serde::Deserialize)]
struct RunConfig {
    update_rate_hz: f64,
}

// ── Expectation counters ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RunStats {
    ticks: u64,
    transport_errors: u64,
    mode_mismatches: u64,
    reloc_violations: u64,
    ranking_violations: u64,
}

impl RunStats {
    fn failed(&self) -> bool {
        self.mode_mismatches > self.ticks / 10
            || self.reloc_violations > 0
            || self.ranking_violations > 0
            || (self.transport_errors > 0 && self.transport_errors == self.ticks)
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nav_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    let config_str = std::fs::read_to_string(&args.config)
        .unwrap_or_else(|_| include_str!("../config.toml").to_string());
    let cfg: FullConfig = toml::from_str(&config_str).expect("Invalid config.toml");

    let Some(scenario) = scenarios::by_name(&args.scenario) else {
        error!("Unknown scenario: {}", args.scenario);
        std::process::exit(2);
    };

    info!(
        "🚶 nav-sim starting — scenario '{}', {} geofences, {} POIs, {:.1} Hz",
        scenario.name,
        scenario.geofences.len(),
        scenario.pois.len(),
        cfg.run.update_rate_hz
    );

    let client = reqwest::Client::new();

    // Fail fast when the backend is not up.
    match client.get(format!("{}/health", args.backend)).send().await {
        Ok(resp) if resp.status().is_success() => {}
        other => {
            error!("Backend not reachable at {} ({other:?}) — start waypath-backend first", args.backend);
            std::process::exit(2);
        }
    }

    let session_id = format!("nav-sim-{}", std::process::id());
    let mut walker = Walker::new(scenario, cfg.walker, args.seed);
    let mut stats = RunStats::default();

    let tick_ms = (1000.0 / cfg.run.update_rate_hz) as u64;
    let mut ticker = interval(Duration::from_millis(tick_ms));
    let dt = (tick_ms as f64 / 1000.0) * args.speed;

    loop {
        ticker.tick().await;

        let sample = walker.tick(dt);
        if sample.finished || stats.ticks >= args.max_ticks {
            break;
        }
        stats.ticks += 1;

        let request = build_tick_request(&session_id, &walker, &sample);
        let decision = match post_tick(&client, &args.backend, &request).await {
            Ok(v) => v,
            Err(e) => {
                warn!("tick POST failed: {e}");
                stats.transport_errors += 1;
                continue;
            }
        };

        check_decision(&sample, &walker, &decision, &mut stats);

        if stats.ticks % 20 == 0 {
            info!(
                "⏱ t={:>5.1}s | mode={} | conf={:.2} | reloc={} | topPois={}",
                sample.elapsed_s,
                decision["mode"]["mode"].as_str().unwrap_or("?"),
                decision["mode"]["confidence"].as_f64().unwrap_or(0.0),
                decision["pose"]["relocalizationNeeded"].as_bool().unwrap_or(false),
                decision["pois"]["topPois"].as_array().map(|a| a.len()).unwrap_or(0),
            );
        }
    }

    info!(
        "🏁 Walk complete: {} ticks | transport errors {} | mode mismatches {} | reloc violations {} | ranking violations {}",
        stats.ticks,
        stats.transport_errors,
        stats.mode_mismatches,
        stats.reloc_violations,
        stats.ranking_violations
    );

    if stats.failed() {
        error!("Expectations NOT met");
        std::process::exit(1);
    }
    info!("All expectations met");
}

// ── Request building ──────────────────────────────────────────────────────────

fn build_tick_request(session_id: &str, walker: &Walker, sample: &WalkSample) -> Value {
    let scenario = walker.scenario();
    json!({
        "sessionId": session_id,
        "gps": sample.gps,
        "vpsResult": sample.vps,
        "route": sample.route,
        "geofences": scenario.geofences,
        "pois": scenario.pois,
        "userGoal": scenario.goal,
        "topK": 5,
    })
}

async fn post_tick(
    client: &reqwest::Client,
    backend: &str,
    request: &Value,
) -> Result<Value, reqwest::Error> {
    client
        .post(format!("{backend}/v1/tick"))
        .json(request)
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await
}

// ── Expectation checks ────────────────────────────────────────────────────────

fn check_decision(sample: &WalkSample, walker: &Walker, decision: &Value, stats: &mut RunStats) {
    let mode = decision["mode"]["mode"].as_str().unwrap_or("?");

    // GPS noise can flip containment right at the fence boundary, so mode is
    // checked statistically (see RunStats::failed) rather than per-tick.
    let mode_ok = if sample.truly_indoor {
        mode == "INDOOR"
    } else {
        mode != "INDOOR"
    };
    if !mode_ok {
        debug!(
            "mode mismatch at t={:.1}s: truly_indoor={} got {mode}",
            sample.elapsed_s, sample.truly_indoor
        );
        stats.mode_mismatches += 1;
    }

    // Relocalization contract: indoors the flag must track VPS availability.
    // Only enforced on ticks the backend also judged indoor, so a boundary
    // mode flip is not double-counted.
    if sample.truly_indoor && mode == "INDOOR" {
        let reloc = decision["pose"]["relocalizationNeeded"].as_bool().unwrap_or(false);
        if sample.vps.is_some() && reloc {
            warn!("relocalization flagged despite a VPS fix at t={:.1}s", sample.elapsed_s);
            stats.reloc_violations += 1;
        }
        if sample.vps.is_none() && walker.scenario().vps_dropped(sample.elapsed_s) && !reloc {
            warn!("VPS dropout not flagged at t={:.1}s", sample.elapsed_s);
            stats.reloc_violations += 1;
        }
    }

    // Ranking contract: ≤ topK, non-increasing scores.
    if let Some(top) = decision["pois"]["topPois"].as_array() {
        if top.len() > 5 {
            stats.ranking_violations += 1;
        }
        let scores: Vec<f64> = top.iter().filter_map(|p| p["score"].as_f64()).collect();
        if scores.windows(2).any(|w| w[0] < w[1]) {
            warn!("ranking not sorted: {scores:?}");
            stats.ranking_violations += 1;
        }
    }
}
