// src/selection.rs
//
// The dashboard selection as one immutable value object. The hosting view
// carries it in the URL query string; the core treats it as the single
// trigger for recomputation and refetch. Every transform returns a new
// value, which keeps the cascade-clear rule (changing region drops the
// finer-grained sub-selection) a pure function.

use chrono::{Datelike, NaiveDate, NaiveTime};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Daily,
    Monthly,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Daily => "daily",
            ViewMode::Monthly => "monthly",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "daily" => Some(ViewMode::Daily),
            "monthly" => Some(ViewMode::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub region: Option<String>,
    pub municipality: Option<String>,
    pub local: Option<String>,
    pub view: ViewMode,
    pub date: Option<NaiveDate>,
    /// (year, month 1-12)
    pub month: Option<(i32, u32)>,
    pub hour: Option<NaiveTime>,
}

impl Selection {
    /// Change the region. Clears the finer-grained sub-selection: a
    /// municipality or local pick under the old region is meaningless.
    pub fn with_region(&self, region: Option<&str>) -> Selection {
        Selection {
            region: region.map(str::to_string),
            municipality: None,
            local: None,
            ..self.clone()
        }
    }

    pub fn with_municipality(&self, municipality: Option<&str>) -> Selection {
        Selection {
            municipality: municipality.map(str::to_string),
            local: None,
            ..self.clone()
        }
    }

    pub fn with_local(&self, local: Option<&str>) -> Selection {
        Selection {
            local: local.map(str::to_string),
            ..self.clone()
        }
    }

    pub fn with_view(&self, view: ViewMode) -> Selection {
        Selection {
            view,
            ..self.clone()
        }
    }

    pub fn with_date(&self, date: NaiveDate) -> Selection {
        Selection {
            date: Some(date),
            ..self.clone()
        }
    }

    pub fn with_month(&self, year: i32, month: u32) -> Selection {
        Selection {
            month: Some((year, month)),
            ..self.clone()
        }
    }

    pub fn with_hour(&self, hour: NaiveTime) -> Selection {
        Selection {
            hour: Some(hour),
            ..self.clone()
        }
    }

    /// Hour of day (0-23) of the selected time, if any.
    pub fn hour_of_day(&self) -> Option<u32> {
        use chrono::Timelike;
        self.hour.map(|t| t.hour())
    }

    /// Weekday of the selected date, if any.
    pub fn weekday(&self) -> Option<chrono::Weekday> {
        self.date.map(|d| d.weekday())
    }

    /// Day of month (1-based) of the selected date, if any.
    pub fn day_of_month(&self) -> Option<u32> {
        self.date.map(|d| d.day())
    }

    // ------------------------------------------------------------------
    // Query-string carrier format
    // ------------------------------------------------------------------

    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(region) = &self.region {
            parts.push(format!("region={}", region));
        }
        if let Some(municipality) = &self.municipality {
            parts.push(format!("municipality={}", municipality));
        }
        if let Some(local) = &self.local {
            parts.push(format!("local={}", local));
        }
        parts.push(format!("view={}", self.view.as_str()));
        if let Some(date) = self.date {
            parts.push(format!("date={}", date.format("%Y-%m-%d")));
        }
        if let Some((year, month)) = self.month {
            parts.push(format!("month={:04}-{:02}", year, month));
        }
        if let Some(hour) = self.hour {
            parts.push(format!("hour={}", hour.format("%H:%M")));
        }
        parts.join("&")
    }

    /// Parse a query string back into a selection. Unknown keys and
    /// malformed values are skipped, never fatal.
    pub fn from_query_string(query: &str) -> Selection {
        let mut selection = Selection::default();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some(kv) => kv,
                None => continue,
            };

            match key {
                "region" if !value.is_empty() => selection.region = Some(value.to_string()),
                "municipality" if !value.is_empty() => {
                    selection.municipality = Some(value.to_string())
                }
                "local" if !value.is_empty() => selection.local = Some(value.to_string()),
                "view" => {
                    if let Some(view) = ViewMode::parse(value) {
                        selection.view = view;
                    }
                }
                "date" => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                    Ok(date) => selection.date = Some(date),
                    Err(_) => debug!("ignoring malformed date '{}'", value),
                },
                "month" => {
                    if let Some((y, m)) = parse_month(value) {
                        selection.month = Some((y, m));
                    } else {
                        debug!("ignoring malformed month '{}'", value);
                    }
                }
                "hour" => match NaiveTime::parse_from_str(value, "%H:%M") {
                    Ok(hour) => selection.hour = Some(hour),
                    Err(_) => debug!("ignoring malformed hour '{}'", value),
                },
                _ => {}
            }
        }

        selection
    }
}

fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let (y, m) = raw.split_once('-')?;
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}
