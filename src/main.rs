//! Command-line front-end for the sequence loaders and layer plans.

use anyhow::{Context, Result};
use attention_lstm_data::graph::GraphSequenceLoader;
use attention_lstm_data::maps::{BatchGenerator, MapSequenceLoader};
use attention_lstm_data::utils::{setup_logging, Config};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "attention_lstm_data")]
#[command(about = "Sliding-window loaders for graph and convolutional attention LSTMs")]
struct Cli {
    /// TOML configuration; defaults are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the map data set and report window shapes
    Maps {
        /// Window length, overriding the configuration
        #[arg(short, long)]
        days: Option<usize>,

        /// Number of batches to draw from the generator
        #[arg(short, long, default_value = "0")]
        batches: usize,
    },

    /// Load the graph data set and report window shapes
    Graph {
        /// Window length, overriding the configuration
        #[arg(short, long)]
        days: Option<usize>,
    },

    /// Print a layer plan as JSON
    Plan {
        #[arg(value_enum)]
        model: ModelKind,
    },

    /// Write the default configuration
    InitConfig {
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelKind {
    Graph,
    Bottleneck,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Maps { days, batches } => {
            let mut maps_config = config.maps.clone();
            if let Some(days) = days {
                maps_config.num_days_per_sample = days;
            }

            let data = MapSequenceLoader::new(maps_config)
                .load()
                .context("Failed to load map sequences")?;

            println!("windows:    {:?}", data.windows.shape());
            println!("targets:    {:?}", data.targets.shape());
            println!("raw inputs: {:?}", data.raw_inputs.shape());

            if batches > 0 {
                let batch_size = config.generator.batch_size;
                let generator = match config.generator.seed {
                    Some(seed) => BatchGenerator::with_seed(&data, batch_size, seed),
                    None => BatchGenerator::new(&data, batch_size),
                }
                .context("Failed to create batch generator")?;

                for (i, (images, targets)) in generator.take(batches).enumerate() {
                    info!(
                        "Batch {}: images {:?}, targets {:?}",
                        i,
                        images.shape(),
                        targets.shape()
                    );
                }
            }
        }

        Commands::Graph { days } => {
            let mut graph_config = config.graph.clone();
            if let Some(days) = days {
                graph_config.num_days_per_sample = days;
            }

            let data = GraphSequenceLoader::new(graph_config)
                .load()
                .context("Failed to load graph sequences")?;

            println!("nodes:             {}", data.nodes.join(","));
            println!("features:          {:?}", data.features.shape());
            println!("adjacency:         {:?}", data.adjacency.shape());
            println!("infection targets: {:?}", data.infection_targets.shape());
            println!("death targets:     {:?}", data.death_targets.shape());
        }

        Commands::Plan { model } => {
            let plan = match model {
                ModelKind::Graph => config.graph_model.plan(),
                ModelKind::Bottleneck => config.bottleneck_model.plan(),
            }
            .context("Invalid model configuration")?;

            info!("{} has {} layers", plan.name, plan.len());
            println!("{}", plan.to_json()?);
        }

        Commands::InitConfig { output } => {
            Config::default()
                .to_file(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}
