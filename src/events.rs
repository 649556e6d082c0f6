// src/events.rs
//
// Incident-event category filter. Maps the UI category selection to the
// backend's query vocabulary, fetches the matching events and reconciles the
// two response shapes the backend is known to produce (a bare list, or a
// list wrapped under "events") into one uniform event list.
//
// Failure policy: a network or decode failure logs and yields an empty list.
// Malformed coordinates ride along untouched; rendering decides what to do
// with them.

use crate::types::TrafficEvent;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// User-facing incident category. The wire codes are a fixed lookup table,
/// not a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    All,
    Accident,
    Construction,
    Weather,
    Incident,
    Disaster,
    Etc,
}

impl EventCategory {
    pub const ALL_CATEGORIES: [EventCategory; 7] = [
        EventCategory::All,
        EventCategory::Accident,
        EventCategory::Construction,
        EventCategory::Weather,
        EventCategory::Incident,
        EventCategory::Disaster,
        EventCategory::Etc,
    ];

    /// Backend query-parameter code.
    pub fn query_code(self) -> &'static str {
        match self {
            EventCategory::All => "all",
            EventCategory::Accident => "acc",
            EventCategory::Construction => "cor",
            EventCategory::Weather => "wea",
            EventCategory::Incident => "ete",
            EventCategory::Disaster => "dis",
            EventCategory::Etc => "etc",
        }
    }

    /// Legend label shown next to the map.
    pub fn label(self) -> &'static str {
        match self {
            EventCategory::All => "All",
            EventCategory::Accident => "Accident",
            EventCategory::Construction => "Construction",
            EventCategory::Weather => "Weather",
            EventCategory::Incident => "Other Incident",
            EventCategory::Disaster => "Disaster",
            EventCategory::Etc => "Etc.",
        }
    }

    pub fn from_query_code(code: &str) -> Option<Self> {
        Self::ALL_CATEGORIES
            .into_iter()
            .find(|c| c.query_code() == code)
    }
}

/// The backend answers either `{ "events": [...] }` or a bare array.
/// Both variants normalize to the identical event list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EventResponse {
    Wrapped { events: Vec<TrafficEvent> },
    Bare(Vec<TrafficEvent>),
}

impl EventResponse {
    pub fn into_events(self) -> Vec<TrafficEvent> {
        match self {
            EventResponse::Wrapped { events } => events,
            EventResponse::Bare(events) => events,
        }
    }
}

/// Lenient coordinate parse. Never panics: anything unparseable comes back
/// as NaN and is passed through to the caller.
pub fn parse_coordinate(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

pub struct EventClient {
    http: reqwest::Client,
    base_url: String,
}

impl EventClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building event HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch every event matching `category`. One request per category
    /// change; any failure degrades to an empty list.
    pub async fn fetch_events(&self, category: EventCategory) -> Vec<TrafficEvent> {
        let url = format!(
            "{}/traffic-events?eventType={}",
            self.base_url,
            category.query_code()
        );

        let response = match self.http.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("event fetch failed for {}: {}", category.label(), e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(
                "event fetch for {} returned {}",
                category.label(),
                response.status()
            );
            return Vec::new();
        }

        match response.json::<EventResponse>().await {
            Ok(body) => {
                let events = body.into_events();
                info!("🗺️ {} event(s) for {}", events.len(), category.label());
                events
            }
            Err(e) => {
                warn!("event response decode failed: {}", e);
                Vec::new()
            }
        }
    }
}
