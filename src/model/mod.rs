//! Layer plans for the attention LSTM model families.
//!
//! A plan is a framework-neutral, validated list of layers with their
//! hyper-parameters and token/image shapes. Nothing here computes activations.

mod bottleneck;
mod graph_lstm;
mod kernel;
mod layers;

pub use bottleneck::AttentionBottleneckConfig;
pub use graph_lstm::GraphAttentionLstmConfig;
pub use kernel::calc_kernel_size;
pub use layers::{LayerPlan, LayerSpec};
