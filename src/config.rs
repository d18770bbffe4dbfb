use clap::Parser;
use std::path::PathBuf;

/// Waveform files (flow, pressure, realpresdata, snoredata) are sampled at this rate.
pub const SAMPLE_RATE_HZ: u32 = 25;

/// Morning usetime segments shorter than this are separate short sessions.
pub const MIN_SESSION_SECS: u32 = 1500;

/// A night complies with therapy when used at least this long.
pub const COMPLIANCE_HOURS: f64 = 4.0;

/// Device pressure units are 0.1 cmH2O.
pub const PRESSURE_SCALE: f64 = 0.1;

/// Reconstruct nightly CPAP usage and respiratory metrics from SD-card dumps
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory containing YYYYMMDD sub-directories
    #[arg(help = "Directory containing YYYYMMDD sub-directories")]
    pub input_path: PathBuf,

    /// Only report the most recent N dates (each still paired with its previous directory)
    #[arg(long, env = "CPAP_DAYS")]
    pub days: Option<usize>,

    /// Write one CSV row per night to this path
    #[arg(long)]
    pub csv_output: Option<PathBuf>,

    /// Print nights as JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Skip the text report (useful with --csv-output)
    #[arg(long)]
    pub quiet: bool,
}
