//! nanoaod-convert CLI
//!
//! Converts JSON-lines NanoAOD event records into grid, graph or flat-table
//! datasets.
//!
//! # Usage
//!
//! ```bash
//! # 16x16x5 occupancy grids, stop after ~50k events
//! nanoaod-convert grid out/ zerobias_grid.json run1.jsonl run2.jsonl --limit-events 50000
//!
//! # k-NN graphs of the 40 hardest PF candidates, bincode output
//! nanoaod-convert graph out/ zerobias run1.jsonl --format bincode
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use nanoaod_convert::export::{self, Dataset, GraphDataset, OutputFormat, GRAPH_EXTENSION};
use nanoaod_convert::tables::{JET_DATASET, MULTIPLICITY_DATASET};
use nanoaod_convert::{pipeline, ConvertConfig, GraphEngine, GridEngine, JsonLinesSource};

#[derive(Parser, Debug)]
#[command(name = "nanoaod-convert")]
#[command(about = "Convert NanoAOD event records into fixed-size datasets for anomaly detection", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// (N, 16, 16, 5) occupancy grids of jets, electrons, photons, muons and taus
    Grid(IoArgs),
    /// Per-event k-nearest-neighbor graphs of particle-flow candidates
    Graph(IoArgs),
    /// (N, 8) object multiplicities and missing transverse momentum
    Basic(IoArgs),
    /// (N, 136) attributes of the leading 8 jets
    Jets(IoArgs),
}

#[derive(clap::Args, Debug)]
struct IoArgs {
    /// Directory to write the output file into (created if missing)
    output_dir: PathBuf,

    /// Output file name inside the output directory
    output_file: String,

    /// JSON-lines input files, read in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Stop after this many events (checked between batches)
    #[arg(long)]
    limit_events: Option<usize>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output container format: json or bincode
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Events per batch
    #[arg(long)]
    batch_size: Option<usize>,
}

impl IoArgs {
    /// File config first, then command-line overrides.
    fn resolve_config(&self) -> Result<ConvertConfig> {
        let mut config = match &self.config {
            Some(path) => ConvertConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ConvertConfig::default(),
        };
        if let Some(limit) = self.limit_events {
            config.limit_events = Some(limit);
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        config.validate()?;
        Ok(config)
    }

    fn source(&self, config: &ConvertConfig) -> JsonLinesSource {
        JsonLinesSource::open(self.files.iter().cloned()).with_batch_size(config.batch_size)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!(version = nanoaod_convert::VERSION, "start");

    match &cli.command {
        Command::Grid(args) => convert_grid(args)?,
        Command::Graph(args) => convert_graph(args)?,
        Command::Basic(args) => convert_basic(args)?,
        Command::Jets(args) => convert_jets(args)?,
    }

    info!("done");
    Ok(())
}

fn write_dataset(args: &IoArgs, config: &ConvertConfig, dataset: &Dataset) -> Result<()> {
    let path = export::output_path(&args.output_dir, &args.output_file, None);
    info!(dataset = %dataset.name, shape = ?dataset.shape, "total number of events processed: {}", dataset.len());
    write_output(dataset, config.format, &path)
}

fn write_output<T: serde::Serialize>(value: &T, format: OutputFormat, path: &Path) -> Result<()> {
    export::write_file(value, format, path).with_context(|| format!("writing {}", path.display()))
}

fn convert_grid(args: &IoArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let engine = GridEngine::new(&config.grid)?;
    let (grids, summary) = pipeline::run(&mut args.source(&config), &engine, config.limit_events)?;
    if summary.dropped_particles > 0 {
        info!(dropped = summary.dropped_particles, "particles outside the eta acceptance");
    }
    write_dataset(args, &config, &Dataset::from_grids(grids)?)
}

fn convert_graph(args: &IoArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let engine = GraphEngine::new(&config.graph)?;
    let (graphs, summary) = pipeline::run(&mut args.source(&config), &engine, config.limit_events)?;
    if let Some(mean) = summary.mean_nodes() {
        info!("average candidates per graph: {mean:.4}");
    }
    if summary.skipped > 0 {
        info!(skipped = summary.skipped, "events without candidates skipped");
    }
    let dataset = GraphDataset::new(graphs);
    info!("total number of graphs: {}", dataset.len());
    let path = export::output_path(&args.output_dir, &args.output_file, Some(GRAPH_EXTENSION));
    write_output(&dataset, config.format, &path)
}

fn convert_basic(args: &IoArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let (table, _) = pipeline::run(&mut args.source(&config), &config.multiplicity, config.limit_events)?;
    write_dataset(args, &config, &Dataset::from_table(MULTIPLICITY_DATASET, &table)?)
}

fn convert_jets(args: &IoArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let (table, _) = pipeline::run(&mut args.source(&config), &config.jets, config.limit_events)?;
    write_dataset(args, &config, &Dataset::from_table(JET_DATASET, &table)?)
}
