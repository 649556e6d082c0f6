// src/api.rs
//
// Clients for the traffic-statistics backend: hourly metrics, daily accident
// counts and the optional server-side vehicle share. Every call degrades to
// "no data" on failure; dependent charts render empty or zeroed series
// instead of stale data.
//
// When the backend has no entry for a (region, date) pair, a synthetic
// hourly series stands in: a deterministic regional base plus a sinusoidal
// day shape and bounded noise, so the charts stay alive during backend gaps.

use crate::types::{MetricSeries, HOURS_PER_DAY, REGIONS};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::Deserialize;
use std::f64::consts::PI;
use std::time::Duration;
use tracing::{info, warn};

/// One backend record: metrics for a single hour of the day.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlyRecord {
    pub hour: String,
    pub traffic: f64,
    pub speed: f64,
}

/// The two hourly series the daily charts consume.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    pub traffic: MetricSeries,
    pub speed: MetricSeries,
}

impl HourlySeries {
    pub fn empty() -> Self {
        Self {
            traffic: MetricSeries::empty(),
            speed: MetricSeries::empty(),
        }
    }

    fn from_records(records: &[HourlyRecord]) -> Self {
        let parse = |r: &HourlyRecord| r.hour.trim().parse::<u32>().ok();
        Self {
            traffic: MetricSeries::from_samples(
                records.iter().filter_map(|r| Some((parse(r)?, r.traffic))),
            ),
            speed: MetricSeries::from_samples(
                records.iter().filter_map(|r| Some((parse(r)?, r.speed))),
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: f64,
}

#[derive(Debug, Deserialize)]
struct DailyCountResponse {
    #[allow(dead_code)]
    region: String,
    data: Vec<DailyCount>,
}

/// Server-provided vehicle share. When present and well-formed it supersedes
/// the synthesized distribution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerShare {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
    #[serde(default)]
    pub icons: Vec<String>,
}

impl ServerShare {
    pub fn is_well_formed(&self) -> bool {
        !self.data.is_empty()
            && self.labels.len() == self.data.len()
            && self.data.iter().all(|v| *v >= 0)
    }
}

pub struct TrafficApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl TrafficApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building statistics HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Hourly traffic and speed for a region. `None` means "no data" (network
    /// failure, non-2xx or undecodable body), never an error.
    pub async fn hourly(&self, region: &str) -> Option<HourlySeries> {
        let url = format!("{}/traffic/hourly?region={}", self.base_url, region);
        let records: Vec<HourlyRecord> = self.get_json(&url, "hourly metrics").await?;
        info!("📈 {} hourly record(s) for {}", records.len(), region);
        Some(HourlySeries::from_records(&records))
    }

    /// Daily accident counts for a region; empty on failure.
    pub async fn daily_counts(&self, region: &str) -> Vec<DailyCount> {
        let url = format!(
            "{}/traffic-events/daily-count?region={}",
            self.base_url, region
        );
        match self.get_json::<DailyCountResponse>(&url, "daily counts").await {
            Some(body) => body.data,
            None => Vec::new(),
        }
    }

    /// Server-side vehicle share, if the backend offers one for this region.
    pub async fn vehicle_share(&self, region: &str) -> Option<ServerShare> {
        let url = format!("{}/traffic/vehicle-share?region={}", self.base_url, region);
        let share: ServerShare = self.get_json(&url, "vehicle share").await?;
        if !share.is_well_formed() {
            warn!("vehicle-share payload for {} is malformed, ignoring", region);
            return None;
        }
        Some(share)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> Option<T> {
        let response = match self.http.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("{} request failed: {}", what, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("{} returned {}", what, response.status());
            return None;
        }

        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("{} decode failed: {}", what, e);
                None
            }
        }
    }
}

/// Spread daily counts into a day-indexed vector (`values[d - 1]` is day `d`)
/// for the given month. Records from other months or with malformed dates
/// are dropped.
pub fn day_values(counts: &[DailyCount], year: i32, month: u32) -> Vec<f64> {
    let mut values = vec![0.0; 31];
    for record in counts {
        let date = match NaiveDate::parse_from_str(&record.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => continue,
        };
        if date.year() == year && date.month() == month {
            values[(date.day() - 1) as usize] = record.count;
        }
    }
    values
}

// ============================================================================
// SYNTHETIC FALLBACK SERIES
// ============================================================================

const BASE_TRAFFIC: f64 = 80.0;
const BASE_SPEED: f64 = 40.0;
const TRAFFIC_DAY_SWING: f64 = 50.0;
const SPEED_DAY_SWING: f64 = 20.0;
const TRAFFIC_NOISE: f64 = 30.0;
const SPEED_NOISE: f64 = 10.0;

fn region_offset(region: &str) -> f64 {
    REGIONS
        .iter()
        .position(|r| *r == region)
        .unwrap_or(0) as f64
}

/// Generate a plausible 24-hour series for (region, date): deterministic
/// regional base, sinusoidal day shape, bounded noise from the caller's RNG.
pub fn synthetic_hourly<R: Rng>(region: &str, date: NaiveDate, rng: &mut R) -> HourlySeries {
    let offset = region_offset(region);
    // vary slightly by day so consecutive dates do not look identical
    let day_offset = (date.day() % 2) as f64;

    let base_traffic = BASE_TRAFFIC + offset * 5.0 + day_offset * 10.0;
    let base_speed = BASE_SPEED + offset * 2.0 - day_offset;

    let mut traffic = [None; HOURS_PER_DAY];
    let mut speed = [None; HOURS_PER_DAY];

    for hour in 0..HOURS_PER_DAY {
        let phase = hour as f64 / HOURS_PER_DAY as f64 * PI;
        traffic[hour] = Some(
            (base_traffic + TRAFFIC_DAY_SWING * phase.sin() + rng.gen::<f64>() * TRAFFIC_NOISE)
                .round(),
        );
        speed[hour] = Some(
            (base_speed + SPEED_DAY_SWING * phase.cos() + rng.gen::<f64>() * SPEED_NOISE).round(),
        );
    }

    HourlySeries {
        traffic: MetricSeries::from_values(traffic),
        speed: MetricSeries::from_values(speed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_client_construction_reports_errors() {
        let client = TrafficApiClient::new("http://localhost:8000/", Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[test]
    fn test_hourly_records_into_series() {
        let json = r#"[
            {"hour": "00", "traffic": 95.0, "speed": 58.0},
            {"hour": "01", "traffic": 88.0, "speed": 61.0},
            {"hour": "14", "traffic": 180.0, "speed": 42.0}
        ]"#;
        let records: Vec<HourlyRecord> = serde_json::from_str(json).unwrap();
        let series = HourlySeries::from_records(&records);

        assert_eq!(series.traffic.get(0), Some(95.0));
        assert_eq!(series.speed.get(14), Some(42.0));
        // hours the backend skipped stay missing
        assert_eq!(series.traffic.get(2), None);
    }

    #[test]
    fn test_bad_hour_strings_are_dropped() {
        let records = vec![
            HourlyRecord {
                hour: "xx".to_string(),
                traffic: 1.0,
                speed: 1.0,
            },
            HourlyRecord {
                hour: "07".to_string(),
                traffic: 120.0,
                speed: 55.0,
            },
        ];
        let series = HourlySeries::from_records(&records);
        assert_eq!(series.traffic.get(7), Some(120.0));
        assert!(!series.traffic.is_empty());
    }

    #[test]
    fn test_daily_counts_spread_by_day() {
        let counts = vec![
            DailyCount {
                date: "2025-05-03".to_string(),
                count: 12.0,
            },
            DailyCount {
                date: "2025-05-23".to_string(),
                count: 40.0,
            },
            DailyCount {
                date: "2025-04-30".to_string(), // other month, dropped
                count: 99.0,
            },
            DailyCount {
                date: "not-a-date".to_string(),
                count: 7.0,
            },
        ];

        let values = day_values(&counts, 2025, 5);
        assert_eq!(values[2], 12.0);
        assert_eq!(values[22], 40.0);
        assert_eq!(values.iter().sum::<f64>(), 52.0);
    }

    #[test]
    fn test_server_share_well_formedness() {
        let good: ServerShare = serde_json::from_str(
            r#"{"labels":["Car","Bus","Truck","Motorcycle"],"data":[40,25,20,15]}"#,
        )
        .unwrap();
        assert!(good.is_well_formed());

        let mismatched: ServerShare =
            serde_json::from_str(r#"{"labels":["Car"],"data":[40,60]}"#).unwrap();
        assert!(!mismatched.is_well_formed());

        let negative: ServerShare =
            serde_json::from_str(r#"{"labels":["Car","Bus"],"data":[120,-20]}"#).unwrap();
        assert!(!negative.is_well_formed());
    }

    #[test]
    fn test_synthetic_series_covers_every_hour() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 26).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let series = synthetic_hourly("부산", date, &mut rng);

        for hour in 0..24 {
            let traffic = series.traffic.get(hour).unwrap();
            let speed = series.speed.get(hour).unwrap();
            assert!(traffic >= 0.0 && traffic < 400.0);
            assert!(speed >= 0.0 && speed < 150.0);
        }
    }

    #[test]
    fn test_synthetic_series_region_base_shifts() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 26).unwrap();
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);

        // 천안 sits ten slots after 서울: with identical noise draws its
        // traffic base is 50 higher at every hour
        let seoul = synthetic_hourly("서울", date, &mut rng_a);
        let cheonan = synthetic_hourly("천안", date, &mut rng_b);

        let diff = cheonan.traffic.get(6).unwrap() - seoul.traffic.get(6).unwrap();
        assert_eq!(diff, 50.0);
    }
}
