// src/lookup.rs
//
// Nearest-camera lookup, issued on map marker clicks. Rapid consecutive
// clicks race their responses, so every request takes a monotonically
// increasing ticket and only the most recently initiated request may settle
// into a stream selection; anything older is discarded silently.

use crate::types::StreamSource;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Payload of a successful nearest-camera lookup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraInfo {
    pub coordx: String,
    pub coordy: String,
    pub cctvurl: String,
    pub cctvname: String,
}

impl CameraInfo {
    pub fn into_stream_source(self) -> StreamSource {
        StreamSource {
            url: self.cctvurl,
            name: self.cctvname,
        }
    }
}

/// The lookup backend answers with the camera payload or `{"error": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NearestResponse {
    Camera(CameraInfo),
    Error {
        #[allow(dead_code)]
        error: serde_json::Value,
    },
}

/// Identifies one lookup request for staleness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket(u64);

/// How a settled lookup affects the stream selection.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Forward this source to the session manager.
    Update(StreamSource),
    /// Failed or error-flagged: clear the selection (manager goes idle).
    Clear,
    /// A newer lookup was initiated meanwhile; apply nothing.
    Stale,
}

pub struct NearestLookupClient {
    http: reqwest::Client,
    base_url: String,
    issued: AtomicU64,
}

impl NearestLookupClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building nearest-cctv HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            issued: AtomicU64::new(0),
        })
    }

    /// Look up the camera nearest to (lat, lng) and settle the result against
    /// the latest issued ticket.
    pub async fn lookup(&self, lat: f64, lng: f64) -> LookupOutcome {
        let ticket = self.issue_ticket();
        debug!("nearest-cctv lookup #{} at ({:.4}, {:.4})", ticket.0, lat, lng);
        let fetched = self.fetch(lat, lng).await;
        self.settle(ticket, fetched)
    }

    pub fn issue_ticket(&self) -> LookupTicket {
        LookupTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        ticket.0 == self.issued.load(Ordering::SeqCst)
    }

    /// Turn a fetched result into a selection outcome, discarding it when the
    /// ticket is no longer current.
    pub fn settle(&self, ticket: LookupTicket, fetched: Option<CameraInfo>) -> LookupOutcome {
        if !self.is_current(ticket) {
            // Routine under rapid marker clicks; not a failure.
            debug!("lookup #{} superseded, discarding", ticket.0);
            return LookupOutcome::Stale;
        }
        match fetched {
            Some(camera) => LookupOutcome::Update(camera.into_stream_source()),
            None => LookupOutcome::Clear,
        }
    }

    async fn fetch(&self, lat: f64, lng: f64) -> Option<CameraInfo> {
        let url = format!(
            "{}/api/nearest-cctv?lat={}&lng={}",
            self.base_url, lat, lng
        );

        let response = match self.http.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("nearest-cctv request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("nearest-cctv returned {}", response.status());
            return None;
        }

        match response.json::<NearestResponse>().await {
            Ok(NearestResponse::Camera(camera)) => Some(camera),
            Ok(NearestResponse::Error { .. }) => {
                warn!("nearest-cctv answered with an error payload");
                None
            }
            Err(e) => {
                warn!("nearest-cctv decode failed: {}", e);
                None
            }
        }
    }
}
