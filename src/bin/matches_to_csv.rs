use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;

use squeeze_scan::output::ndjson_to_csv;

/// Read an NDJSON match log on stdin and write it as CSV on stdout.
#[derive(Debug, Parser)]
struct Args {}

fn main() -> Result<()> {
    let _args = Args::parse();
    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    ndjson_to_csv(stdin, stdout).context("failed to convert match log")?;
    Ok(())
}
