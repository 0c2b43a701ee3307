use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use std::path::PathBuf;

use squeeze_scan::criteria::{CriterionSpec, TickerFilter};
use squeeze_scan::output::{MatchLogger, NdjsonMatchLog, NoopLogger, print_match, print_summary};
use squeeze_scan::pipeline::scan_directory;
use squeeze_scan::store::{FileBackedTickerStore, TickerStore};

#[derive(Debug, Parser)]
#[command(
    about = "Filter a directory of daily price histories and copy the tickers that satisfy every criterion."
)]
struct Args {
    /// Directory with one <SYMBOL>.csv (Date,Open,High,Low,Close,Adj Close,Volume) per ticker
    #[arg(long)]
    input_dir: PathBuf,

    /// Criteria every ticker must satisfy: `double_price_within_a_week`,
    /// `low_high:<multiplier>:<days>` or `adj_close:<multiplier>:<days>`
    #[arg(long, num_args = 1.., default_value = "double_price_within_a_week")]
    filters: Vec<CriterionSpec>,

    /// Matching tickers are written here as <SYMBOL>.csv (existing files are overwritten)
    #[arg(long)]
    output_path: PathBuf,

    /// Append one JSON line per match to this file
    #[arg(long)]
    match_log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    squeeze_scan::logging::init_logger("squeeze_scan");

    if !args.output_path.is_dir() {
        bail!("{:?} is not an existing directory", args.output_path);
    }

    let filter = TickerFilter::from_specs(&args.filters);
    info!(input = ?args.input_dir, "input directory");
    let names = filter.names().join(" ");
    info!(filters = %names, "filters");
    info!(output = ?args.output_path, "output path");

    let scans = scan_directory(&args.input_dir, &filter)
        .with_context(|| format!("failed to scan {:?}", args.input_dir))?;

    let logger: Box<dyn MatchLogger> = match &args.match_log {
        Some(path) => Box::new(NdjsonMatchLog::new(path.clone())),
        None => Box::new(NoopLogger),
    };

    let mut store = FileBackedTickerStore::new(&args.output_path);
    let mut kept: Vec<String> = Vec::new();

    for scan in scans.iter().filter(|s| s.is_kept()) {
        let Some(history) = &scan.history else {
            continue;
        };
        if let Err(err) = store.store(&scan.symbol, history) {
            warn!(ticker = %scan.symbol, error = %err, "failed to store price history");
            continue;
        }
        for record in scan.records() {
            print_match(&record);
            logger.log(&record)?;
        }
        kept.push(scan.symbol.clone());
    }

    let failed = scans.iter().filter(|s| s.is_failed()).count();
    info!(matched = kept.len(), failed, "finished filtering tickers");

    println!();
    print_summary(scans.len(), failed, &kept);

    Ok(())
}
