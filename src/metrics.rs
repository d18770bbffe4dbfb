use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::config::COMPLIANCE_HOURS;
use crate::records::EventRecord;
use crate::session::NightStreams;

/// Linear-interpolation percentile over an ascending slice, `p` in 0..=100.
/// Returns 0 for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let k = (sorted.len() - 1) as f64 * p / 100.0;
    let f = k.floor() as usize;
    if f + 1 >= sorted.len() {
        return sorted[f.min(sorted.len() - 1)];
    }
    sorted[f] + (k - f as f64) * (sorted[f + 1] - sorted[f])
}

/// Middle value, or the average of the two middle values. 0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn from_ahi(ahi: f64) -> Severity {
        if ahi < 5.0 {
            Severity::Normal
        } else if ahi < 15.0 {
            Severity::Mild
        } else if ahi < 30.0 {
            Severity::Moderate
        } else {
            Severity::Severe
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Normal => "normal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        };
        f.write_str(label)
    }
}

/// Summary statistics for one reconstructed night.
///
/// Pressure figures stay in device units (0.1 cmH2O); the output layer
/// converts them for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Night {
    pub date: NaiveDate,
    pub usage_hours: f64,
    pub ahi: f64,
    pub ai_count: usize,
    pub hi_count: usize,
    pub csa_count: usize,
    pub snore_count: usize,
    pub ai_total_duration_sec: u64,
    pub hi_total_duration_sec: u64,
    pub leak_avg: f64,
    pub pressure_min: f64,
    pub pressure_max: f64,
    pub pressure_mean: f64,
    pub pressure_median: f64,
    pub pressure_p90: f64,
    pub pressure_p95: f64,
    pub br_mean: f64,
    pub br_median: f64,
    pub tv_mean: f64,
    pub tv_median: f64,
}

impl Night {
    pub fn from_streams(streams: &NightStreams) -> Night {
        let usage_hours = streams.usage_hours;
        let ai_count = streams.ai.len();
        let hi_count = streams.hi.len();
        let ahi = if usage_hours > 0.0 {
            (ai_count + hi_count) as f64 / usage_hours
        } else {
            0.0
        };

        let mut pressure: Vec<f64> = streams.pressure.iter().map(|&p| p as f64).collect();
        pressure.sort_by(f64::total_cmp);

        let breath_rates: Vec<f64> = streams.breathing.iter().map(|r| r.breath_rate as f64).collect();
        let tidal_volumes: Vec<f64> = streams.breathing.iter().map(|r| r.tidal_volume as f64).collect();
        let leak: Vec<f64> = streams.leak.iter().map(|&b| b as f64).collect();

        Night {
            date: streams.date,
            usage_hours,
            ahi,
            ai_count,
            hi_count,
            csa_count: streams.csa.len(),
            snore_count: streams.snore.len(),
            ai_total_duration_sec: total_duration(&streams.ai),
            hi_total_duration_sec: total_duration(&streams.hi),
            leak_avg: mean(&leak),
            pressure_min: pressure.first().copied().unwrap_or(0.0),
            pressure_max: pressure.last().copied().unwrap_or(0.0),
            pressure_mean: mean(&pressure),
            pressure_median: median(&pressure),
            pressure_p90: percentile(&pressure, 90.0),
            pressure_p95: percentile(&pressure, 95.0),
            br_mean: mean(&breath_rates),
            br_median: median(&breath_rates),
            tv_mean: mean(&tidal_volumes),
            tv_median: median(&tidal_volumes),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::from_ahi(self.ahi)
    }

    pub fn complies(&self) -> bool {
        self.usage_hours >= COMPLIANCE_HOURS
    }
}

fn total_duration(events: &[EventRecord]) -> u64 {
    events.iter().map(|e| e.value as u64).sum()
}
