// src/types.rs

use serde::{Deserialize, Serialize};

pub const HOURS_PER_DAY: usize = 24;

/// Every region the dashboard can monitor, in sidebar order.
pub const REGIONS: [&str; 11] = [
    "서울", "청주", "전주", "광주", "서해안", "부산", "강원", "경기", "대전", "대구", "천안",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub charts: ChartConfig,
    pub share: ShareConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub stats_base_url: String,
    pub cctv_base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Hour-mode windows cover `reference - size ..= reference` (size + 1 entries).
    pub hour_window_size: usize,
    /// Day-mode windows always contain exactly `size` entries.
    pub day_window_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Symmetric bound for the per-category integer perturbation.
    pub noise_amplitude: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// One metric (traffic volume or average speed) indexed by hour of day.
/// A `None` slot means the backend had no sample for that hour.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    values: [Option<f64>; HOURS_PER_DAY],
}

impl MetricSeries {
    pub fn empty() -> Self {
        Self {
            values: [None; HOURS_PER_DAY],
        }
    }

    pub fn from_values(values: [Option<f64>; HOURS_PER_DAY]) -> Self {
        Self { values }
    }

    /// Build a series from (hour, value) samples. Hours outside 0-23 are dropped.
    pub fn from_samples(samples: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let mut values = [None; HOURS_PER_DAY];
        for (hour, value) in samples {
            if let Some(slot) = values.get_mut(hour as usize) {
                *slot = Some(value);
            }
        }
        Self { values }
    }

    pub fn get(&self, hour: u32) -> Option<f64> {
        self.values.get(hour as usize).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| v.is_none())
    }
}

/// One map-plottable incident as delivered by the events backend.
/// Coordinates stay as raw strings on the wire; `latitude()` / `longitude()`
/// parse leniently and never panic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficEvent {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(rename = "eventDetailType", default)]
    pub event_detail_type: String,
    #[serde(rename = "startDate", default)]
    pub start_date: String,
    #[serde(rename = "coordX", default)]
    pub coord_x: String,
    #[serde(rename = "coordY", default)]
    pub coord_y: String,
}

impl TrafficEvent {
    pub fn latitude(&self) -> f64 {
        crate::events::parse_coordinate(&self.coord_y)
    }

    pub fn longitude(&self) -> f64 {
        crate::events::parse_coordinate(&self.coord_x)
    }

    pub fn has_finite_position(&self) -> bool {
        self.latitude().is_finite() && self.longitude().is_finite()
    }
}

/// A live-video source selected from the map, as returned by the
/// nearest-camera lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSource {
    pub url: String,
    pub name: String,
}
