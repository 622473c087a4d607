//! # Attention LSTM data
//!
//! Data preparation for spatio-temporal forecasting with attention LSTMs: daily
//! epidemiological maps and per-state statistics over flight graphs, cut into
//! fixed-length sliding windows.
//!
//! ## Modules
//!
//! - `maps` - daily maps aligned with an outcome series, plus an infinite batch generator
//! - `graph` - covid statistics aligned with daily flight adjacency matrices
//! - `model` - layer plans for graph attention and attention bottleneck LSTMs
//! - `dates` - lookup and chronological date formats
//! - `utils` - configuration, logging and progress bars
//!
//! ## Example
//!
//! ```rust,no_run
//! use attention_lstm_data::prelude::*;
//!
//! fn main() -> attention_lstm_data::Result<()> {
//!     let config = Config::from_file("config.toml")?;
//!
//!     // Windows of 7 daily maps, each followed by the next day's death rate
//!     let maps = MapSequenceLoader::new(config.maps.clone()).load()?;
//!     let mut batches = BatchGenerator::new(&maps, config.generator.batch_size)?;
//!     let (images, targets) = batches.next_batch();
//!
//!     // Windows of node features and flight graphs
//!     let graph = GraphSequenceLoader::new(config.graph.clone()).load()?;
//!     let plan = config
//!         .graph_model
//!         .clone()
//!         .with_input_shapes(graph.node_input_shape(), graph.edge_input_shape())
//!         .plan()?;
//!
//!     println!("{:?} {:?} {} layers", images.shape(), targets.shape(), plan.len());
//!     Ok(())
//! }
//! ```

pub mod dates;
pub mod error;
pub mod graph;
pub mod maps;
pub mod model;
pub mod utils;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dates::DateTriple;
    pub use crate::error::{Error, Result};
    pub use crate::graph::{GraphData, GraphSequenceData, GraphSequenceLoader};
    pub use crate::maps::{BatchGenerator, MapSequenceData, MapSequenceLoader};
    pub use crate::model::{AttentionBottleneckConfig, GraphAttentionLstmConfig, LayerPlan};
    pub use crate::utils::{Config, GeneratorConfig, GraphConfig, MapsConfig};
}
