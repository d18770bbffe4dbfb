use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use cpap_decoder::data_loading::{date_stem, parse_date_dir_name, read_day_files};
use cpap_decoder::records::{
    nonzero_count, nonzero_range, sample_stats, ApcpRecord, BreathingRecord, ConfigRecord,
    DecodedFile, EventRecord, FileSummary, FileType, SampleStats, UsetimeRecord,
};

fn print_stats(label: &str, stats: Option<SampleStats>) {
    if let Some(s) = stats {
        println!("  {}: min {:.0}, max {:.0}, mean {:.1}", label, s.min, s.max, s.mean);
    }
}

/// Print the decoded contents of one YYYYMMDD directory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YYYYMMDD directory
    day_dir: PathBuf,

    /// Number of records to list per event or breathing file
    #[arg(long, default_value = "5")]
    show: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let name = args
        .day_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let date = parse_date_dir_name(&name)
        .with_context(|| format!("Not a YYYYMMDD directory: {}", args.day_dir.display()))?;
    let files = read_day_files(&args.day_dir, &date_stem(date), &FileType::ALL);

    println!("\n{} ({} files)", date, files.len());
    println!("==============================================================");

    for file_type in FileType::ALL {
        let Some(data) = files.get(&file_type) else {
            continue;
        };
        let summary = match FileSummary::decode(file_type, data) {
            Ok(summary) => summary,
            Err(e) => {
                println!("\n[{}] error: {}", file_type, e);
                continue;
            }
        };

        println!(
            "\n[{}] {} records ({} payload bytes)",
            file_type, summary.num_records, summary.payload_bytes
        );
        println!(
            "  version {:?}, firmware {:?}, signal {:?}",
            summary.header.version, summary.header.firmware, summary.header.signal_name
        );
        println!(
            "  header time range: {} -> {}",
            summary.header.start_time, summary.header.end_time
        );
        if let Some(secs) = summary.duration_secs() {
            println!("  duration: {:.1} min ({:.2} h)", secs / 60.0, secs / 3600.0);
        }

        match file_type {
            FileType::Ai | FileType::Hi | FileType::Csa | FileType::Snore | FileType::Leak => {
                let decoded = DecodedFile::<EventRecord>::decode(data)?;
                for (i, e) in decoded.records.iter().take(args.show).enumerate() {
                    println!(
                        "  #{}: type={}, value={}, time={}",
                        i + 1,
                        e.event_type,
                        e.value,
                        e.timestamp
                    );
                }
            }
            FileType::Apcp => {
                let decoded = DecodedFile::<ApcpRecord>::decode(data)?;
                let pressures: Vec<f64> = decoded.records.iter().map(|r| r.cmh2o()).collect();
                if let (Some(first), Some(last)) = (decoded.records.first(), decoded.records.last()) {
                    let min = pressures.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = pressures.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    println!("  time range: {} -> {}", first.timestamp, last.timestamp);
                    println!("  pressure: {:.1} - {:.1} cmH2O", min, max);
                }
            }
            FileType::Usetime => {
                let decoded = DecodedFile::<UsetimeRecord>::decode(data)?;
                for (i, r) in decoded.records.iter().enumerate() {
                    println!(
                        "  #{}: seconds={}, param=0x{:08x} {:?}, time={}{}",
                        i + 1,
                        r.seconds,
                        r.param_raw,
                        r.param_bytes(),
                        r.timestamp,
                        if r.boundary { " (boundary)" } else { "" }
                    );
                }
            }
            FileType::Config => {
                let decoded = DecodedFile::<ConfigRecord>::decode(data)?;
                for (i, r) in decoded.records.iter().take(3).enumerate() {
                    println!("  #{}: time={} values={:?}", i + 1, r.timestamp, r.values);
                    println!("      raw={}", r.raw_hex());
                }
            }
            FileType::Flow => {
                let decoded = DecodedFile::<u8>::decode(data)?;
                print_stats("values", sample_stats(&decoded.records));
            }
            FileType::Pressure | FileType::RealPresData | FileType::SnoreData => {
                let decoded = DecodedFile::<u16>::decode(data)?;
                print_stats("values", sample_stats(&decoded.records));
            }
            FileType::Mvtvbr => {
                let decoded = DecodedFile::<BreathingRecord>::decode(data)?;
                let field = |f: fn(&BreathingRecord) -> u16| -> Vec<u16> {
                    decoded.records.iter().map(f).collect()
                };
                print_stats("tidal volume", sample_stats(&field(|r| r.tidal_volume)));
                print_stats("breath rate", sample_stats(&field(|r| r.breath_rate)));
                print_stats("field3", sample_stats(&field(|r| r.field3)));
                for (i, r) in decoded.records.iter().take(args.show).enumerate() {
                    println!(
                        "  #{}: tv={}, br={}, field3={}",
                        i + 1,
                        r.tidal_volume,
                        r.breath_rate,
                        r.field3
                    );
                }
            }
            FileType::Spo2Bpm => {
                let decoded = DecodedFile::<u16>::decode(data)?;
                println!(
                    "  non-zero samples: {} of {}",
                    nonzero_count(&decoded.records),
                    decoded.num_records()
                );
                if let Some((lo, hi)) = nonzero_range(&decoded.records) {
                    println!("  non-zero range: {} - {}", lo, hi);
                }
            }
            FileType::Difleak => {
                let decoded = DecodedFile::<u8>::decode(data)?;
                if let Some((lo, hi)) = nonzero_range(&decoded.records) {
                    println!("  non-zero range: {} - {}", lo, hi);
                }
            }
        }
    }

    Ok(())
}
