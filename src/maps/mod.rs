//! Map-sequence data: daily maps aligned with an outcome series.
//!
//! - `loader` - date alignment and sliding windows over resized maps
//! - `generator` - infinite, per-epoch shuffled batch producer
//! - `resize` - aspect-preserving resize with zero padding

mod generator;
mod loader;
mod resize;

pub use generator::{BatchGenerator, MapBatch};
pub use loader::{
    read_maps, read_metadata, read_outcome_rows, read_outcome_table, MapSequenceData,
    MapSequenceLoader, OutcomeRow,
};
pub use resize::{resize_stack, resize_with_pad};
