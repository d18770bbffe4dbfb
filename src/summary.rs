use serde::Serialize;

use crate::metrics::{mean, Night, Severity};

/// Aggregate over a run of nights, as shown at the top of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub nights: usize,
    pub total_usage_hours: f64,
    pub avg_usage_hours: f64,
    pub compliant_nights: usize,
    /// Total AI + HI events over total usage hours.
    pub overall_ahi: f64,
    pub severity: Severity,
    pub total_ai: usize,
    pub total_hi: usize,
    pub total_csa: usize,
    pub total_snore: usize,
    /// Lowest non-zero nightly minimum, device units.
    pub pressure_min: Option<f64>,
    pub pressure_max: Option<f64>,
    /// Averages skip nights where the figure is zero (no data).
    pub avg_pressure_mean: f64,
    pub avg_pressure_p90: f64,
    pub avg_br_mean: f64,
    pub avg_tv_mean: f64,
}

impl HistorySummary {
    /// `None` for an empty slice.
    pub fn from_nights(nights: &[Night]) -> Option<HistorySummary> {
        if nights.is_empty() {
            return None;
        }

        let total_usage_hours: f64 = nights.iter().map(|n| n.usage_hours).sum();
        let total_ai: usize = nights.iter().map(|n| n.ai_count).sum();
        let total_hi: usize = nights.iter().map(|n| n.hi_count).sum();
        let overall_ahi = if total_usage_hours > 0.0 {
            (total_ai + total_hi) as f64 / total_usage_hours
        } else {
            0.0
        };

        let nonzero = |f: fn(&Night) -> f64| -> Vec<f64> {
            nights.iter().map(f).filter(|v| *v > 0.0).collect()
        };

        Some(HistorySummary {
            nights: nights.len(),
            total_usage_hours,
            avg_usage_hours: total_usage_hours / nights.len() as f64,
            compliant_nights: compliant_nights(nights),
            overall_ahi,
            severity: Severity::from_ahi(overall_ahi),
            total_ai,
            total_hi,
            total_csa: nights.iter().map(|n| n.csa_count).sum(),
            total_snore: nights.iter().map(|n| n.snore_count).sum(),
            pressure_min: nonzero(|n| n.pressure_min).into_iter().reduce(f64::min),
            pressure_max: nonzero(|n| n.pressure_max).into_iter().reduce(f64::max),
            avg_pressure_mean: mean(&nonzero(|n| n.pressure_mean)),
            avg_pressure_p90: mean(&nonzero(|n| n.pressure_p90)),
            avg_br_mean: mean(&nonzero(|n| n.br_mean)),
            avg_tv_mean: mean(&nonzero(|n| n.tv_mean)),
        })
    }

    pub fn per_night(&self, total: usize) -> f64 {
        total as f64 / self.nights as f64
    }
}

pub fn compliant_nights(nights: &[Night]) -> usize {
    nights.iter().filter(|n| n.complies()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NightStreams;
    use chrono::NaiveDate;

    fn night(day: u32, usage_hours: f64, ai: usize, hi: usize, pressure: Vec<u32>) -> Night {
        let event = crate::records::EventRecord {
            event_type: 1,
            value: 10,
            timestamp: crate::header::Timestamp::EPOCH,
        };
        Night::from_streams(&NightStreams {
            date: NaiveDate::from_ymd_opt(2022, 5, day).unwrap(),
            usage_hours,
            ai: vec![event; ai],
            hi: vec![event; hi],
            csa: Vec::new(),
            snore: vec![event; 1],
            pressure,
            breathing: Vec::new(),
            leak: Vec::new(),
        })
    }

    #[test]
    fn test_empty_history_has_no_summary() {
        assert_eq!(HistorySummary::from_nights(&[]), None);
    }

    #[test]
    fn test_overall_ahi_weights_by_usage() {
        let nights = vec![
            night(1, 8.0, 10, 6, vec![80, 100]),
            night(2, 2.0, 4, 0, Vec::new()),
            night(3, 4.0, 0, 0, vec![60, 120]),
        ];
        let summary = HistorySummary::from_nights(&nights).unwrap();
        assert_eq!(summary.nights, 3);
        assert_eq!(summary.total_usage_hours, 14.0);
        assert!((summary.overall_ahi - 20.0 / 14.0).abs() < 1e-12);
        assert_eq!(summary.severity, Severity::Normal);
        assert_eq!(summary.compliant_nights, 2);
        assert_eq!(summary.total_snore, 3);
        assert_eq!(summary.per_night(summary.total_ai), 14.0 / 3.0);
    }

    #[test]
    fn test_pressure_figures_skip_nights_without_data() {
        let nights = vec![
            night(1, 8.0, 0, 0, vec![80, 100]),
            night(2, 5.0, 0, 0, Vec::new()),
            night(3, 5.0, 0, 0, vec![60, 120]),
        ];
        let summary = HistorySummary::from_nights(&nights).unwrap();
        assert_eq!(summary.pressure_min, Some(60.0));
        assert_eq!(summary.pressure_max, Some(120.0));
        assert_eq!(summary.avg_pressure_mean, 90.0);
        assert_eq!(summary.avg_br_mean, 0.0);
    }

    #[test]
    fn test_compliance_threshold_is_inclusive() {
        let nights = vec![night(1, 4.0, 0, 0, Vec::new()), night(2, 3.99, 0, 0, Vec::new())];
        assert_eq!(compliant_nights(&nights), 1);
    }
}
