//! Configuration handling.

use crate::error::Result;
use crate::model::{AttentionBottleneckConfig, GraphAttentionLstmConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Map-sequence data set
    pub maps: MapsConfig,
    /// Graph-sequence data set
    pub graph: GraphConfig,
    /// Batch generator over map windows
    pub generator: GeneratorConfig,
    /// Graph attention LSTM layer plan
    pub graph_model: GraphAttentionLstmConfig,
    /// Attention bottleneck layer plan
    pub bottleneck_model: AttentionBottleneckConfig,
}

impl Config {
    /// Load configuration from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Map-sequence loading configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    /// `.npy` stack of 2D maps
    pub maps_path: PathBuf,
    /// JSON list of `[year_suffix, month, day]` triples
    pub metadata_path: PathBuf,
    /// CSV table with `date` and the outcome column
    pub dataset_path: PathBuf,
    /// Target map height after resizing
    pub image_x: usize,
    /// Target map width after resizing
    pub image_y: usize,
    /// Window length
    pub num_days_per_sample: usize,
    /// Outcome column used as the target
    pub outcome_column: String,
    /// Show a progress bar while building windows
    pub show_progress: bool,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            maps_path: PathBuf::from("data/maps.npy"),
            metadata_path: PathBuf::from("data/metadata.json"),
            dataset_path: PathBuf::from("data/covid.csv"),
            image_x: 128,
            image_y: 128,
            num_days_per_sample: 7,
            outcome_column: "death_rate_from_population".to_string(),
            show_progress: true,
        }
    }
}

/// Graph-sequence loading configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// CSV table of per-node covid statistics
    pub covid_path: PathBuf,
    /// CSV flight edge list with one weight column per date
    pub flight_path: PathBuf,
    /// Edge source column
    pub source_column: String,
    /// Edge target column
    pub target_column: String,
    /// Window length
    pub num_days_per_sample: usize,
    /// Show a progress bar while building windows
    pub show_progress: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            covid_path: PathBuf::from("data/covid.csv"),
            flight_path: PathBuf::from("data/flights.csv"),
            source_column: "state_from".to_string(),
            target_column: "state_to".to_string(),
            num_days_per_sample: 7,
            show_progress: true,
        }
    }
}

/// Batch generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Windows per batch
    pub batch_size: usize,
    /// Shuffle seed; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            seed: None,
        }
    }
}
