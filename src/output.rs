use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::config::PRESSURE_SCALE;
use crate::metrics::Night;
use crate::summary::HistorySummary;

/// One rendered night: pressures in cmH2O, floats rounded to 2 places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NightRow {
    pub date: String,
    pub usage_hours: f64,
    pub ahi: f64,
    pub ai_count: usize,
    pub hi_count: usize,
    pub csa_count: usize,
    pub snore_count: usize,
    pub ai_total_duration_sec: u64,
    pub hi_total_duration_sec: u64,
    #[serde(rename = "leak_avg_lpm")]
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

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn cmh2o(device_units: f64) -> f64 {
    device_units * PRESSURE_SCALE
}

impl From<&Night> for NightRow {
    fn from(night: &Night) -> Self {
        let pressure = |p: f64| round2(cmh2o(p));
        NightRow {
            date: night.date.format("%Y-%m-%d").to_string(),
            usage_hours: round2(night.usage_hours),
            ahi: round2(night.ahi),
            ai_count: night.ai_count,
            hi_count: night.hi_count,
            csa_count: night.csa_count,
            snore_count: night.snore_count,
            ai_total_duration_sec: night.ai_total_duration_sec,
            hi_total_duration_sec: night.hi_total_duration_sec,
            leak_avg: round2(night.leak_avg),
            pressure_min: pressure(night.pressure_min),
            pressure_max: pressure(night.pressure_max),
            pressure_mean: pressure(night.pressure_mean),
            pressure_median: pressure(night.pressure_median),
            pressure_p90: pressure(night.pressure_p90),
            pressure_p95: pressure(night.pressure_p95),
            br_mean: round2(night.br_mean),
            br_median: round2(night.br_median),
            tv_mean: round2(night.tv_mean),
            tv_median: round2(night.tv_median),
        }
    }
}

pub fn write_nights_csv<W: Write>(writer: W, nights: &[Night]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for night in nights {
        writer.serialize(NightRow::from(night))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_nights_csv_file(path: &Path, nights: &[Night]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    println!("Writing {} nights to {}", nights.len(), path.display());
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_nights_csv(file, nights)
}

pub fn nights_to_json(nights: &[Night]) -> Result<String> {
    let rows: Vec<NightRow> = nights.iter().map(NightRow::from).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn print_report(nights: &[Night]) {
    let Some(summary) = HistorySummary::from_nights(nights) else {
        println!("No nights found.");
        return;
    };
    let (first, last) = (&nights[0], &nights[nights.len() - 1]);

    println!("\nCPAP therapy report: {} to {}", first.date, last.date);
    println!("==============================================================================");
    println!("      Date  Hours    AHI   AI   HI  CSA  Snore  Leak  P90 (cmH2O)");
    println!("------------------------------------------------------------------------------");
    for night in nights {
        let p90 = if night.pressure_p90 > 0.0 {
            format!("{:.1}", cmh2o(night.pressure_p90))
        } else {
            "--".to_string()
        };
        println!(
            "{}  {:5.1}  {:5.1}  {:3}  {:3}  {:3}  {:5}  {:4.1}  {:>5}",
            night.date,
            night.usage_hours,
            night.ahi,
            night.ai_count,
            night.hi_count,
            night.csa_count,
            night.snore_count,
            night.leak_avg,
            p90
        );
    }
    println!("------------------------------------------------------------------------------");

    println!("\nSummary:");
    println!("  Nights:          {}", summary.nights);
    println!("  Average usage:   {:.1} h/night", summary.avg_usage_hours);
    println!("  Total usage:     {:.1} h", summary.total_usage_hours);
    println!(
        "  Compliance:      {}/{} nights (>= 4 h)",
        summary.compliant_nights, summary.nights
    );
    println!(
        "  AHI:             {:.1} events/h ({})",
        summary.overall_ahi, summary.severity
    );
    println!(
        "    Apnea (AI):    {} ({:.1}/night)",
        summary.total_ai,
        summary.per_night(summary.total_ai)
    );
    println!(
        "    Hypopnea (HI): {} ({:.1}/night)",
        summary.total_hi,
        summary.per_night(summary.total_hi)
    );
    println!(
        "    Central (CSA): {} ({:.1}/night)",
        summary.total_csa,
        summary.per_night(summary.total_csa)
    );
    println!(
        "    Snore:         {} ({:.1}/night)",
        summary.total_snore,
        summary.per_night(summary.total_snore)
    );
    if let Some(min) = summary.pressure_min {
        println!("  Pressure min:    {:.1} cmH2O", cmh2o(min));
    }
    if let Some(max) = summary.pressure_max {
        println!("  Pressure max:    {:.1} cmH2O", cmh2o(max));
    }
    if summary.avg_pressure_mean > 0.0 {
        println!("  Pressure mean:   {:.1} cmH2O", cmh2o(summary.avg_pressure_mean));
    }
    println!("  Pressure P90:    {:.1} cmH2O", cmh2o(summary.avg_pressure_p90));
    println!("  Breath rate:     {:.1} /min", summary.avg_br_mean);
    if summary.avg_tv_mean > 0.0 {
        println!("  Tidal volume:    {:.0} mL", summary.avg_tv_mean);
    }

    println!("\nPer night:");
    for night in nights {
        println!("\n  {}", night.date);
        println!("    Usage: {:.1} h", night.usage_hours);
        println!("    AHI: {:.1} events/h ({})", night.ahi, night.severity());
        println!(
            "      AI={} ({} s) | HI={} ({} s) | CSA={} | snore={}",
            night.ai_count,
            night.ai_total_duration_sec,
            night.hi_count,
            night.hi_total_duration_sec,
            night.csa_count,
            night.snore_count
        );
        if night.pressure_mean > 0.0 {
            println!(
                "    Pressure: {:.1}-{:.1} cmH2O (mean {:.1}, median {:.1}, P90 {:.1}, P95 {:.1})",
                cmh2o(night.pressure_min),
                cmh2o(night.pressure_max),
                cmh2o(night.pressure_mean),
                cmh2o(night.pressure_median),
                cmh2o(night.pressure_p90),
                cmh2o(night.pressure_p95)
            );
        }
        if night.br_mean > 0.0 {
            println!(
                "    Breathing: {:.1} /min (median {:.0}), tidal volume {:.0} mL (median {:.0})",
                night.br_mean, night.br_median, night.tv_mean, night.tv_median
            );
        }
        println!("    Leak: {:.1} L/min", night.leak_avg);
    }
}
