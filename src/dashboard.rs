// src/dashboard.rs
//
// The hosting view state. Owns the current selection and every derived
// output; the selection is the sole trigger for recomputation or refetch.
// Derived state is replaced wholesale on every refresh, and an epoch counter
// makes refreshes last-write-wins: a refresh that resumes after an await and
// finds the selection has moved on drops its results.

use crate::api::{self, HourlySeries, ServerShare, TrafficApiClient};
use crate::events::{EventCategory, EventClient};
use crate::lookup::{LookupOutcome, NearestLookupClient};
use crate::selection::{Selection, ViewMode};
use crate::share::{ShareDistribution, ShareSynthesizer};
use crate::types::{Config, TrafficEvent};
use crate::window::{build_day_window, build_hour_window, DayAlign, TimeWindow};
use anyhow::Result;
use chrono::{Datelike, Local, Timelike};
use std::time::Duration;
use tracing::{debug, info};

/// The pie chart's data source. Server data supersedes synthesis; synthesis
/// is the fallback, never the other way around.
#[derive(Debug, Clone, PartialEq)]
pub enum ShareView {
    Server(ServerShare),
    Synthesized(ShareDistribution),
    Unavailable,
}

/// Everything the charts and the map consume, derived from one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub traffic_window: Option<TimeWindow>,
    pub speed_window: Option<TimeWindow>,
    pub accident_window: Option<TimeWindow>,
    pub share: ShareView,
    pub events: Vec<TrafficEvent>,
}

impl Derived {
    fn empty() -> Self {
        Self {
            traffic_window: None,
            speed_window: None,
            accident_window: None,
            share: ShareView::Unavailable,
            events: Vec::new(),
        }
    }
}

pub struct Dashboard {
    api: TrafficApiClient,
    event_client: EventClient,
    lookup_client: NearestLookupClient,
    synthesizer: ShareSynthesizer,
    hour_window_size: usize,
    day_window_size: usize,

    selection: Selection,
    category: EventCategory,
    derived: Derived,
    epoch: u64,
}

impl Dashboard {
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.backend.request_timeout_secs);
        Ok(Self {
            api: TrafficApiClient::new(&config.backend.stats_base_url, timeout)?,
            event_client: EventClient::new(&config.backend.stats_base_url, timeout)?,
            lookup_client: NearestLookupClient::new(&config.backend.cctv_base_url, timeout)?,
            synthesizer: ShareSynthesizer::new(config.share.noise_amplitude),
            hour_window_size: config.charts.hour_window_size,
            day_window_size: config.charts.day_window_size,
            selection: Selection::default(),
            category: EventCategory::All,
            derived: Derived::empty(),
            epoch: 0,
        })
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// Replace the selection. Old derived state is dropped immediately so a
    /// failed refresh shows empty charts, never stale ones. Any in-flight
    /// refresh becomes stale.
    pub fn apply_selection(&mut self, selection: Selection) {
        if selection == self.selection {
            return;
        }
        self.epoch += 1;
        self.selection = selection;
        self.derived = Derived::empty();
    }

    /// Change the incident category filter; invalidates in-flight refreshes
    /// the same way a selection change does.
    pub fn set_category(&mut self, category: EventCategory) {
        if category == self.category {
            return;
        }
        self.epoch += 1;
        self.category = category;
        self.derived.events = Vec::new();
    }

    /// Fetch and recompute everything for the current selection.
    /// Suspends only at network boundaries; all derivation is synchronous.
    pub async fn refresh(&mut self) {
        let epoch = self.epoch;

        let Some(region) = self.selection.region.clone() else {
            debug!("no region selected, nothing to derive");
            self.derived = Derived::empty();
            return;
        };

        let now = Local::now();
        let reference_hour = self.selection.hour_of_day().unwrap_or_else(|| now.hour());
        let date = self.selection.date.unwrap_or_else(|| now.date_naive());
        let weekday = date.weekday();

        // ── hourly metrics, daily view only ───────────────────────────────
        // Monthly view never shows the hour charts, so it never fetches them.
        let hourly = if self.selection.view == ViewMode::Daily {
            let fetched = self.api.hourly(&region).await;
            if self.epoch != epoch {
                debug!("refresh superseded after hourly fetch, discarding");
                return;
            }
            Some(fetched.unwrap_or_else(|| {
                info!("no hourly data for {} on {}, synthesizing", region, date);
                api::synthetic_hourly(&region, date, &mut rand::thread_rng())
            }))
        } else {
            None
        };

        // ── daily accident counts ─────────────────────────────────────────
        let counts = self.api.daily_counts(&region).await;
        if self.epoch != epoch {
            debug!("refresh superseded after daily counts, discarding");
            return;
        }

        // ── vehicle share (server wins over synthesis) ────────────────────
        let server_share = self.api.vehicle_share(&region).await;
        if self.epoch != epoch {
            debug!("refresh superseded after vehicle share, discarding");
            return;
        }

        // ── incident events ───────────────────────────────────────────────
        let events = self.event_client.fetch_events(self.category).await;
        if self.epoch != epoch {
            debug!("refresh superseded after events fetch, discarding");
            return;
        }

        self.derived = self.derive(
            &region,
            hourly.as_ref(),
            &counts,
            server_share,
            events,
            reference_hour,
            date,
            weekday,
        );
        info!(
            "✅ Dashboard refreshed for {} (hour {}, {} events)",
            region,
            reference_hour,
            self.derived.events.len()
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn derive(
        &self,
        region: &str,
        hourly: Option<&HourlySeries>,
        counts: &[api::DailyCount],
        server_share: Option<ServerShare>,
        events: Vec<TrafficEvent>,
        reference_hour: u32,
        date: chrono::NaiveDate,
        weekday: chrono::Weekday,
    ) -> Derived {
        let (traffic_window, speed_window) = match hourly {
            Some(series) => (
                Some(build_hour_window(&series.traffic, reference_hour, self.hour_window_size)),
                Some(build_hour_window(&series.speed, reference_hour, self.hour_window_size)),
            ),
            None => (None, None),
        };

        let values = api::day_values(counts, date.year(), date.month());
        let accident_window =
            build_day_window(&values, date.day(), self.day_window_size, DayAlign::Trailing);

        let share = choose_share(server_share, || {
            self.synthesizer
                .synthesize(region, reference_hour, weekday, &mut rand::thread_rng())
        });

        Derived {
            traffic_window,
            speed_window,
            accident_window: Some(accident_window),
            share,
            events,
        }
    }

    /// Map marker click: nearest-camera lookup with staleness guarding. The
    /// caller feeds the outcome to the stream session manager.
    pub async fn resolve_marker_click(&self, lat: f64, lng: f64) -> LookupOutcome {
        self.lookup_client.lookup(lat, lng).await
    }
}

fn choose_share(
    server: Option<ServerShare>,
    synthesize: impl FnOnce() -> ShareDistribution,
) -> ShareView {
    match server {
        Some(share) => ShareView::Server(share),
        None => ShareView::Synthesized(synthesize()),
    }
}
