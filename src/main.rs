use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hashlife::{NodeTable, io};

/// Advance a Life pattern and print the result as RLE.
#[derive(Parser)]
#[command(version, about)]
struct Opts {
    /// RLE pattern file
    pattern: PathBuf,

    /// Number of generations to advance
    generations: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let rle = fs::read_to_string(&opts.pattern)
        .with_context(|| format!("read {}", opts.pattern.display()))?;

    let mut table = NodeTable::new();
    let root = io::rle::from_rle(&mut table, &rle)
        .with_context(|| format!("decode {}", opts.pattern.display()))?;
    info!(population = table.node(root).pop, "pattern loaded");

    let result = table.advance(root, opts.generations);
    info!(
        population = table.node(result).pop,
        nodes = table.len(),
        "advanced {} generations",
        opts.generations
    );

    println!("{}", io::rle::to_rle(&table, result));
    Ok(())
}
