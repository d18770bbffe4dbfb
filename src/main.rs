use anyhow::Result;
use clap::Parser;
use log::info;

use cpap_decoder::config::Args;
use cpap_decoder::data_loading::load_history;
use cpap_decoder::output::{nights_to_json, print_report, write_nights_csv_file};
use cpap_decoder::session::{reconstruct_history, reconstruct_recent};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    let args = Args::parse();

    let dirs = load_history(&args.input_path)?;
    let nights = match args.days {
        Some(days) => reconstruct_recent(&dirs, days),
        None => reconstruct_history(&dirs),
    };
    info!("Reconstructed {} nights from {} directories", nights.len(), dirs.len());

    if nights.is_empty() {
        println!("No nights found in {}", args.input_path.display());
        std::process::exit(1);
    }

    if let Some(path) = &args.csv_output {
        write_nights_csv_file(path, &nights)?;
    }

    if args.json {
        println!("{}", nights_to_json(&nights)?);
    } else if !args.quiet {
        print_report(&nights);
    }

    Ok(())
}
