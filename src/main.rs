//! Daylight timeline CLI - entry point and output handling.

use yearlight::cli::{self, CliOptions};
use yearlight::engine::DaylightEngine;
use yearlight::error::CliError;
use yearlight::locations::encode_share_param;
use yearlight::output;
use yearlight::types::LocationSeries;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match cli::parse_cli(args) {
        Ok(options) => {
            if let Err(err) = run(options) {
                eprintln!("Error: {}", err);
                std::process::exit(1);
            }
        }
        Err(CliError::Exit(message)) => {
            println!("{}", message);
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn run(options: CliOptions) -> Result<(), String> {
    if options.print_link {
        println!("{}", encode_share_param(&options.locations));
        return Ok(());
    }

    let mut engine = DaylightEngine::new();
    let (datasets, notices) = match options.reference_date {
        Some(date) => engine.datasets_for(&options.locations, date),
        None => engine.datasets(&options.locations),
    };

    for notice in &notices {
        eprintln!("Warning: {}", notice);
    }
    if datasets.is_empty() {
        return Err("No location produced data".to_string());
    }

    if options.table {
        for (i, dataset) in datasets.iter().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{}", dataset.location.name);
            println!("{}", output::render_series_table(dataset, options.step_days));
        }
    } else {
        for (i, dataset) in datasets.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_today(dataset)?;
        }
    }
    Ok(())
}

fn print_today(dataset: &LocationSeries) -> Result<(), String> {
    let stats = output::today_stats(dataset)
        .ok_or_else(|| format!("No data for today at {}", dataset.location.name))?;

    let offset = dataset.location.timezone_offset.unwrap_or(0);
    println!("{} — {} (UTC{:+})", stats.location_name, stats.timezone_label, offset);
    println!("  Sunrise   {}", stats.sunrise);
    println!("  Sunset    {}", stats.sunset);
    println!("  Daylight  {}  ({})", stats.daylight, stats.change);
    if !stats.forecast.is_empty() {
        println!("  {}", stats.forecast);
    }
    Ok(())
}
