use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rustc_hash::FxHashMap;
use tracing::info;
use tracing_subscriber::EnvFilter;
use umibk::{BkTree, DistanceCache, EncodedBarcode, IndexConfig, SearchStrategy, UNBOUNDED_FREQ};

#[derive(Parser, Debug)]
#[command(name = "umibk", about = "Inspect and query a BK-tree barcode index")]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an index and print its shape.
    Stats {
        /// Barcode counts (`BARCODE[<tab>COUNT]` per line).
        counts: PathBuf,
    },
    /// List barcodes within an edit distance of a target.
    Query {
        /// Barcode counts (`BARCODE[<tab>COUNT]` per line).
        counts: PathBuf,
        /// Barcode to search around.
        #[arg(long)]
        target: String,
        /// Maximum edit distance.
        #[arg(short, long, default_value_t = 1)]
        k: u32,
        /// Only report barcodes seen at most this many times.
        #[arg(long)]
        max_freq: Option<u32>,
        /// Descent strategy: sequential, batched or parallel.
        #[arg(long, default_value_t = SearchStrategy::Sequential)]
        strategy: SearchStrategy,
        /// Remove matches (and the target) instead of only listing them.
        #[arg(long)]
        remove: bool,
        /// Memoise distance computations.
        #[arg(long)]
        cache: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Stats { counts } => run_stats(counts)?,
        Commands::Query {
            counts,
            target,
            k,
            max_freq,
            strategy,
            remove,
            cache,
        } => run_query(counts, &target, k, max_freq, strategy, remove, cache)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_stats(counts_path: PathBuf) -> Result<()> {
    let (freqs, barcode_len) = read_counts(&counts_path)?;
    let index = BkTree::build(freqs, IndexConfig::new(barcode_len))
        .context("failed to build index")?;
    println!("{}", index.stats());
    Ok(())
}

fn run_query(
    counts_path: PathBuf,
    target: &str,
    k: u32,
    max_freq: Option<u32>,
    strategy: SearchStrategy,
    remove: bool,
    cache: bool,
) -> Result<()> {
    let target: EncodedBarcode = target
        .parse()
        .with_context(|| format!("invalid target barcode '{target}'"))?;
    let (freqs, barcode_len) = read_counts(&counts_path)?;
    let lookup: FxHashMap<EncodedBarcode, u32> =
        freqs.iter().map(|(barcode, freq)| (barcode.clone(), *freq)).collect();

    let mut config = IndexConfig::new(barcode_len)
        .with_max_edits(k)
        .with_strategy(strategy);
    if cache {
        config = config.with_cache(Arc::new(DistanceCache::new()));
    }
    let mut index = BkTree::build(freqs, config).context("failed to build index")?;

    let max_freq = max_freq.unwrap_or(UNBOUNDED_FREQ);
    let mut hits: Vec<EncodedBarcode> = if remove {
        index.query_and_remove(&target, k, max_freq)
    } else {
        index.near(&target, k, max_freq)
    }
    .context("query failed")?
    .into_iter()
    .collect();
    hits.sort();

    for barcode in &hits {
        let freq = lookup.get(barcode).copied().unwrap_or(0);
        let dist = umibk::distance(&target, barcode)?;
        println!("{barcode}\t{freq}\t{dist}");
    }
    info!(matches = hits.len(), remaining = index.len(), "query complete");

    Ok(())
}

/// Read `BARCODE[<tab>COUNT]` lines; repeated barcodes are summed.
fn read_counts(path: &PathBuf) -> Result<(Vec<(EncodedBarcode, u32)>, usize)> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
    );

    let mut order = Vec::new();
    let mut totals: FxHashMap<EncodedBarcode, u32> = FxHashMap::default();
    let mut barcode_len = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let seq = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing barcode on line {}", line_no + 1))?;
        let count: u32 = match fields.next() {
            Some(raw) => raw.parse().with_context(|| {
                format!("invalid count '{}' on line {}", raw, line_no + 1)
            })?,
            None => 1,
        };
        if count == 0 {
            continue;
        }

        let barcode: EncodedBarcode = seq
            .parse()
            .with_context(|| format!("invalid barcode on line {}", line_no + 1))?;
        match barcode_len {
            None => barcode_len = Some(barcode.len()),
            Some(len) if len != barcode.len() => bail!(
                "barcode on line {} has {} bases, expected {}",
                line_no + 1,
                barcode.len(),
                len
            ),
            Some(_) => {}
        }

        let total = totals.entry(barcode.clone()).or_insert(0);
        if *total == 0 {
            order.push(barcode);
        }
        *total = total.saturating_add(count);
    }

    let Some(barcode_len) = barcode_len else {
        bail!("no barcodes found in {}", path.display());
    };
    let freqs = order
        .into_iter()
        .map(|barcode| {
            let freq = totals[&barcode];
            (barcode, freq)
        })
        .collect();
    info!(barcodes = totals.len(), barcode_len, "loaded barcode counts");
    Ok((freqs, barcode_len))
}
