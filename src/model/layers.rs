//! Layer descriptors shared by the model plans

use serde::{Deserialize, Serialize};

/// One step of a layer plan.
///
/// Recurrent variants name the cell an external framework wraps in an RNN layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum LayerSpec {
    /// Model input with its per-sample shape
    Input { name: String, shape: Vec<usize> },

    /// Multi-head graph attention LSTM over `(nodes, adjacency)` sequences
    GraphAttentionLstm {
        name: String,
        units: usize,
        num_heads: usize,
        sequence_length: usize,
        output_size: usize,
        residual: bool,
        concat_output: bool,
        use_bias: bool,
        return_sequences: bool,
    },

    /// Convolutional multi-head attention LSTM over image sequences
    ConvAttentionLstm {
        name: String,
        units: usize,
        num_heads: usize,
        d_model: usize,
        image_dims: [usize; 2],
        kernel_size: [usize; 2],
        activation: String,
        recurrent_activation: String,
        mha_feature_activation: String,
        mha_output_activation: String,
        return_sequences: bool,
    },

    /// 2x2 max pooling; `image_dims` is the pooled size
    MaxPool2d { image_dims: [usize; 2] },

    /// Concatenate image tokens, zero pad tokens and graph tokens along the token axis
    TokenJoin {
        image_tokens: usize,
        pad_tokens: usize,
        graph_tokens: usize,
        d_model: usize,
    },

    /// Zero the pad tokens occupying `[offset, offset + pad_tokens)` again
    RefreshPadTokens { offset: usize, pad_tokens: usize },

    /// Multi-head self-attention LSTM over a token sequence
    AttentionLstm {
        name: String,
        units: usize,
        num_heads: usize,
        d_model: usize,
        num_tokens: usize,
        activation: String,
        recurrent_activation: String,
        return_sequences: bool,
    },

    /// Mean over `axis` (negative counts from the end)
    ReduceMean { axis: isize },

    /// Fully connected output layer
    Dense {
        units: usize,
        activation: String,
    },
}

impl LayerSpec {
    /// Layer name, for the variants that carry one
    pub fn name(&self) -> Option<&str> {
        match self {
            LayerSpec::Input { name, .. }
            | LayerSpec::GraphAttentionLstm { name, .. }
            | LayerSpec::ConvAttentionLstm { name, .. }
            | LayerSpec::AttentionLstm { name, .. } => Some(name),
            _ => None,
        }
    }

    /// True for the recurrent cell variants
    pub fn is_recurrent(&self) -> bool {
        matches!(
            self,
            LayerSpec::GraphAttentionLstm { .. }
                | LayerSpec::ConvAttentionLstm { .. }
                | LayerSpec::AttentionLstm { .. }
        )
    }
}

/// Ordered layers of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPlan {
    /// Model name
    pub name: String,
    /// Layers in evaluation order; streams of a multi-input model are interleaved
    pub layers: Vec<LayerSpec>,
}

impl LayerPlan {
    /// Number of layers, inputs included
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True when the plan has no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Number of recurrent layers
    pub fn recurrent_layers(&self) -> usize {
        self.layers.iter().filter(|l| l.is_recurrent()).count()
    }

    /// Pretty JSON rendering of the plan
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
