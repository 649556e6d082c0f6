// src/window.rs
//
// Fixed-size rolling windows over metric series, aligned to a reference
// instant. Pure functions: same inputs, same window, no hidden state.
//
// Hour mode trails the reference hour and wraps around midnight (modulo 24).
// Day mode never wraps; a day outside the source range reads as 0 because
// bar charts cannot render gaps the way line charts render nulls.

use crate::types::MetricSeries;

/// One chart slot: a tick label and the value under it.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEntry {
    pub label: String,
    pub value: Option<f64>,
}

/// A fixed-length, time-aligned slice of a metric series.
///
/// `now_index` marks the reference instant inside `entries`. It is computed
/// once, here, so label generation and highlight logic can never disagree.
/// It is only meaningful when `entries` is non-empty; an empty window
/// carries 0 and has nothing to highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindow {
    pub entries: Vec<WindowEntry>,
    pub now_index: usize,
}

impl TimeWindow {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.entries.iter().map(|e| e.value).collect()
    }
}

/// How a day-mode window sits relative to its reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayAlign {
    /// `reference - half ..= reference + half`; reference at the center.
    Centered,
    /// `reference - (size-1) ..= reference`; reference last.
    Trailing,
}

/// Trailing hour window covering `reference_hour - size ..= reference_hour`,
/// wrapping modulo 24. Produces `size + 1` entries; the reference hour is the
/// last one. Missing source hours stay `None` so line charts show a gap.
pub fn build_hour_window(series: &MetricSeries, reference_hour: u32, size: usize) -> TimeWindow {
    let reference_hour = reference_hour % 24;
    let mut entries = Vec::with_capacity(size + 1);

    for offset in -(size as i64)..=0 {
        let hour = (reference_hour as i64 + offset).rem_euclid(24) as u32;
        entries.push(WindowEntry {
            label: format_hour_label(hour),
            value: series.get(hour),
        });
    }

    let now_index = entries.len() - 1;
    TimeWindow { entries, now_index }
}

/// Day window of exactly `size` entries around `reference_day` (1-based day
/// of month). No wraparound: a day outside `day_values` reads as 0. A `size`
/// of 0 yields an empty window.
///
/// `day_values[d - 1]` holds the value for day `d`.
pub fn build_day_window(
    day_values: &[f64],
    reference_day: u32,
    size: usize,
    align: DayAlign,
) -> TimeWindow {
    if size == 0 {
        return TimeWindow {
            entries: Vec::new(),
            now_index: 0,
        };
    }

    let (first_offset, now_index) = match align {
        DayAlign::Centered => {
            let half = (size / 2) as i64;
            (-half, size / 2)
        }
        DayAlign::Trailing => (-(size as i64 - 1), size - 1),
    };

    let mut entries = Vec::with_capacity(size);
    for i in 0..size as i64 {
        let day = reference_day as i64 + first_offset + i;
        let value = if day >= 1 {
            day_values.get((day - 1) as usize).copied().unwrap_or(0.0)
        } else {
            0.0
        };
        entries.push(WindowEntry {
            label: format!("day{}", day),
            value: Some(value),
        });
    }

    TimeWindow { entries, now_index }
}

/// 12-hour clock label with AM/PM suffix: 0 -> "12AM", 13 -> "1PM".
pub fn format_hour_label(hour: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let h12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}{}", h12, suffix)
}
