// src/main.rs

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};
use traffic_dashboard::dashboard::{Dashboard, ShareView};
use traffic_dashboard::lookup::LookupOutcome;
use traffic_dashboard::selection::Selection;
use traffic_dashboard::stream::{
    AdaptiveTransport, MediaSink, SelectOutcome, StreamSessionManager, TransportFactory,
};
use traffic_dashboard::types::{Config, REGIONS};

/// Headless stand-in for the hosting view's video element: logs what the
/// session manager does to it.
struct LogSink;

impl MediaSink for LogSink {
    fn set_source(&mut self, url: Option<&str>) {
        match url {
            Some(url) => debug!("sink source set to {}", url),
            None => debug!("sink source cleared"),
        }
    }

    fn supports_native_hls(&self) -> bool {
        false
    }

    fn request_play(&mut self) -> Result<(), String> {
        info!("▶️ Playback started");
        Ok(())
    }
}

struct LogTransport;

impl AdaptiveTransport for LogTransport {
    fn load_source(&mut self, url: &str) {
        debug!("transport loading {}", url);
    }

    fn attach(&mut self) {
        debug!("transport attached to sink");
    }

    fn destroy(&mut self) {
        debug!("transport destroyed");
    }
}

struct LogTransportFactory;

impl TransportFactory for LogTransportFactory {
    type Transport = LogTransport;

    fn is_supported(&self) -> bool {
        true
    }

    fn create(&mut self) -> LogTransport {
        LogTransport
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    // RUST_LOG overrides the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("🚦 Traffic Monitoring Dashboard Starting");
    info!("✓ Configuration loaded");
    info!(
        "Chart windows: {} hours / {} days, share noise ±{}",
        config.charts.hour_window_size, config.charts.day_window_size, config.share.noise_amplitude
    );

    let mut dashboard = Dashboard::new(&config)?;
    let mut sessions = StreamSessionManager::new(LogSink, LogTransportFactory);

    // Selection comes from the first CLI argument as a query string, or
    // defaults to the first sidebar region.
    let selection = match std::env::args().nth(1) {
        Some(query) => Selection::from_query_string(&query),
        None => Selection::default().with_region(Some(REGIONS[0])),
    };
    info!("Selection: {}", selection.to_query_string());
    dashboard.apply_selection(selection);

    let mut ticker = tokio::time::interval(Duration::from_secs(config.refresh.interval_secs));

    loop {
        ticker.tick().await;
        dashboard.refresh().await;
        report(&dashboard);

        // Follow the first plottable incident with the live stream, the way
        // a marker click would.
        let target = dashboard
            .derived()
            .events
            .iter()
            .find(|e| e.has_finite_position())
            .map(|e| (e.latitude(), e.longitude()));

        if let Some((lat, lng)) = target {
            match dashboard.resolve_marker_click(lat, lng).await {
                LookupOutcome::Update(source) => {
                    if sessions.current_source() != Some(&source) {
                        info!("📍 Nearest camera: {}", source.name);
                        if let SelectOutcome::Attaching { generation } =
                            sessions.select(Some(source))
                        {
                            // Headless transport is ready immediately.
                            sessions.manifest_ready(generation);
                        }
                    }
                }
                LookupOutcome::Clear => {
                    sessions.select(None);
                }
                LookupOutcome::Stale => {}
            }
        }
    }
}

fn report(dashboard: &Dashboard) {
    let derived = dashboard.derived();

    match &derived.traffic_window {
        Some(window) => {
            let shown = window.values().iter().filter(|v| v.is_some()).count();
            info!("📈 Traffic window: {}/{} hours populated", shown, window.len());
        }
        None => warn!("No traffic data for the current selection"),
    }

    if let Some(window) = &derived.accident_window {
        let total: f64 = window.values().iter().flatten().sum();
        info!(
            "🚨 Accidents over {} day(s): {}",
            window.len(),
            total as i64
        );
    }

    match &derived.share {
        ShareView::Server(share) => info!("🚗 Vehicle share (server): {:?}", share.data),
        ShareView::Synthesized(dist) => {
            info!("🚗 Vehicle share (synthesized): {:?}", dist.percents())
        }
        ShareView::Unavailable => {}
    }

    info!("🗺️ {} incident(s) on the map", derived.events.len());
}
