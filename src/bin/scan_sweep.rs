use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use squeeze_scan::config::SweepConfig;
use squeeze_scan::criteria::TickerFilter;
use squeeze_scan::output::{
    MatchRecord, SweepRow, most_extreme, write_matches_csv, write_sweep_overview,
};
use squeeze_scan::pipeline::{evaluate_histories, load_histories};
use squeeze_scan::store::list_csv_files;

const EXTREME_ROWS: usize = 20;

#[derive(Debug, Parser)]
struct Args {
    /// config-file path
    #[arg(long)]
    config: PathBuf,
}

/// Run every (multiplier, days) combination of the config over the same set
/// of price histories, write one result CSV per combination and a markdown
/// overview next to them.
fn main() -> Result<()> {
    let args = Args::parse();
    squeeze_scan::logging::init_logger("scan_sweep");

    let config = SweepConfig::load(args.config.clone())
        .with_context(|| format!("failed to load config from {:?}", args.config))?;
    let specs = config.specs()?;

    let files = list_csv_files(&config.data_dir)
        .with_context(|| format!("failed to list {:?}", config.data_dir))?;
    let histories = load_histories(&files);
    let loaded = histories.iter().filter(|(_, h)| h.is_ok()).count();

    println!(
        "Loaded {} of {} price histories from {:?}",
        loaded,
        histories.len(),
        config.data_dir
    );

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {:?}", config.output_dir))?;

    let mut rows: Vec<SweepRow> = Vec::with_capacity(specs.len());
    let mut all_records: Vec<MatchRecord> = Vec::new();

    for spec in &specs {
        let filter = TickerFilter::from_specs(std::slice::from_ref(spec));
        let scans = evaluate_histories(&histories, &filter);

        let records: Vec<MatchRecord> = scans.iter().flat_map(|scan| scan.records()).collect();

        let path = config.result_path(spec);
        let file = File::create(&path).with_context(|| format!("failed to create {path:?}"))?;
        write_matches_csv(&records, BufWriter::new(file))?;
        info!(path = ?path, matches = records.len(), "wrote sweep result");

        let relative = if loaded > 0 {
            100.0 * records.len() as f64 / loaded as f64
        } else {
            0.0
        };
        rows.push(SweepRow {
            series: spec.series.to_string(),
            multiplier: spec.config.multiplier(),
            days: spec.config.window(),
            count: records.len(),
            relative,
        });
        all_records.extend(records);
    }

    let extremes = most_extreme(&all_records, EXTREME_ROWS);

    println!();
    write_sweep_overview(&rows, &extremes, io::stdout().lock())?;

    let overview = config.overview_path();
    let file =
        File::create(&overview).with_context(|| format!("failed to create {overview:?}"))?;
    write_sweep_overview(&rows, &extremes, BufWriter::new(file))?;
    info!(path = ?overview, "wrote sweep overview");

    Ok(())
}
