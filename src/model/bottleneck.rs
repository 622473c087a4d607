//! Attention bottleneck plan: image and graph streams joined into one token sequence.
//!
//! Layers before `join_layer` run two parallel streams, a convolutional attention LSTM
//! over the map sequence and a graph attention LSTM over the node sequence. At
//! `join_layer` the image tokens, a block of zero pad tokens and the graph tokens are
//! concatenated and every later layer is a self-attention LSTM over all of them.

use super::layers::{LayerPlan, LayerSpec};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hybrid image/graph attention LSTM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionBottleneckConfig {
    /// Units of each recurrent layer; the last entry is the output layer
    pub layer_units: Vec<usize>,
    /// Window length of the map sequence
    pub sequence_length: usize,
    pub num_heads: usize,
    /// Zero tokens inserted between image and graph tokens
    pub num_pad_tokens: usize,
    /// Index of the layer where both streams merge
    pub join_layer: usize,
    /// Zero the pad tokens again after every joint layer
    pub refresh_pad_tokens: bool,
    /// Token width
    pub d_model: usize,
    /// Width of the final dense layer
    pub output_size: usize,

    /// Map size `[height, width]`
    pub image_dims: [usize; 2],
    pub kernel_size: [usize; 2],
    pub activation: String,
    pub recurrent_activation: String,
    pub mha_feature_activation: String,
    pub mha_output_activation: String,
    /// Halve the map size after every image layer
    pub use_maxpool: bool,

    /// Per-sample node input shape `[window_len, nodes, features]`
    pub input_shape_nodes: Vec<usize>,
    /// Per-sample adjacency input shape `[window_len, nodes, nodes]`
    pub input_shape_edges: Vec<usize>,
    /// Number of graph nodes, which become graph tokens after the join
    pub sequence_length_graph: usize,
    pub residual: bool,
    pub use_bias: bool,
    pub concat_output: bool,

    pub name: String,
}

impl Default for AttentionBottleneckConfig {
    fn default() -> Self {
        Self {
            layer_units: vec![32, 32, 32, 16],
            sequence_length: 7,
            num_heads: 4,
            num_pad_tokens: 4,
            join_layer: 2,
            refresh_pad_tokens: true,
            d_model: 16,
            output_size: 1,
            image_dims: [128, 128],
            kernel_size: [16, 16],
            activation: "tanh".to_string(),
            recurrent_activation: "hard_sigmoid".to_string(),
            mha_feature_activation: "relu".to_string(),
            mha_output_activation: "linear".to_string(),
            use_maxpool: true,
            input_shape_nodes: vec![7, 49, 5],
            input_shape_edges: vec![7, 49, 49],
            sequence_length_graph: 49,
            residual: true,
            use_bias: true,
            concat_output: false,
            name: "Conv2DAttentionLSTMModel".to_string(),
        }
    }
}

impl AttentionBottleneckConfig {
    /// Take graph input shapes and node count from loaded windows.
    pub fn with_input_shapes(mut self, nodes: Vec<usize>, edges: Vec<usize>) -> Self {
        if let Some(&n) = nodes.get(1) {
            self.sequence_length_graph = n;
        }
        self.input_shape_nodes = nodes;
        self.input_shape_edges = edges;
        self
    }

    /// Take the window length and map size from loaded map windows.
    pub fn with_image_input(mut self, sequence_length: usize, image_dims: [usize; 2]) -> Self {
        self.sequence_length = sequence_length;
        self.image_dims = image_dims;
        self
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.layer_units.len() < 2 {
            return invalid(
                "layer_units needs at least one joint layer and an output layer".to_string(),
            );
        }
        // the joint stack must start before the output layer
        if self.join_layer + 1 >= self.layer_units.len() {
            return invalid(format!(
                "join_layer {} is out of bounds for {} layers",
                self.join_layer,
                self.layer_units.len()
            ));
        }
        if self.num_heads == 0 || self.d_model == 0 {
            return invalid("num_heads and d_model must be at least 1".to_string());
        }
        if self.image_dims.contains(&0) || self.kernel_size.contains(&0) {
            return invalid(format!(
                "image_dims {:?} and kernel_size {:?} must be positive",
                self.image_dims, self.kernel_size
            ));
        }
        if self.use_maxpool && self.join_layer > 0 {
            let shrink = 1usize << self.join_layer.min(usize::BITS as usize - 1);
            if self.image_dims[0] < shrink || self.image_dims[1] < shrink {
                return invalid(format!(
                    "image_dims {:?} vanish after {} max pools",
                    self.image_dims, self.join_layer
                ));
            }
        }
        Ok(())
    }

    /// Validated layer plan; image and graph layers alternate before the join.
    pub fn plan(&self) -> Result<LayerPlan> {
        self.validate()?;

        let mut layers = vec![
            LayerSpec::Input {
                name: format!("{}_images", self.name),
                shape: vec![self.sequence_length, self.image_dims[0], self.image_dims[1]],
            },
            LayerSpec::Input {
                name: format!("{}_nodes", self.name),
                shape: self.input_shape_nodes.clone(),
            },
            LayerSpec::Input {
                name: format!("{}_adjacency", self.name),
                shape: self.input_shape_edges.clone(),
            },
        ];

        let mut image_dims = self.image_dims;
        let mut num_tokens = self.num_tokens(image_dims);
        let last = self.layer_units.len() - 1;

        for (i, &units) in self.layer_units[..last].iter().enumerate() {
            if i < self.join_layer {
                layers.push(LayerSpec::ConvAttentionLstm {
                    name: format!("{}_mhaLSTMCell_{}", self.name, i),
                    units,
                    num_heads: self.num_heads,
                    d_model: self.d_model,
                    image_dims,
                    kernel_size: self.kernel_size,
                    activation: self.activation.clone(),
                    recurrent_activation: self.recurrent_activation.clone(),
                    mha_feature_activation: self.mha_feature_activation.clone(),
                    mha_output_activation: self.mha_output_activation.clone(),
                    return_sequences: true,
                });

                if self.use_maxpool {
                    image_dims = [image_dims[0] / 2, image_dims[1] / 2];
                    layers.push(LayerSpec::MaxPool2d { image_dims });
                }

                layers.push(LayerSpec::GraphAttentionLstm {
                    name: format!("{}_cell_{}", self.name, i),
                    units,
                    num_heads: self.num_heads,
                    sequence_length: self.sequence_length_graph,
                    output_size: self.d_model,
                    residual: self.residual,
                    concat_output: self.concat_output,
                    use_bias: self.use_bias,
                    return_sequences: true,
                });
                continue;
            }

            if i == self.join_layer {
                num_tokens = self.num_tokens(image_dims);
                layers.push(LayerSpec::TokenJoin {
                    image_tokens: image_dims[0] * image_dims[1],
                    pad_tokens: self.num_pad_tokens,
                    graph_tokens: self.sequence_length_graph,
                    d_model: self.d_model,
                });
            }

            layers.push(self.attention_lstm(
                format!("{}_mhacell_{}", self.name, i),
                units,
                self.d_model,
                num_tokens,
                true,
            ));

            if self.refresh_pad_tokens && self.num_pad_tokens > 0 {
                layers.push(LayerSpec::RefreshPadTokens {
                    offset: image_dims[0] * image_dims[1],
                    pad_tokens: self.num_pad_tokens,
                });
            }
        }

        layers.push(self.attention_lstm(
            format!("{}_mhacell_out", self.name),
            self.layer_units[last],
            1,
            num_tokens,
            false,
        ));
        layers.push(LayerSpec::Dense {
            units: self.output_size,
            activation: "linear".to_string(),
        });

        Ok(LayerPlan {
            name: self.name.clone(),
            layers,
        })
    }

    /// Token count of the joint sequence for a given (pooled) map size.
    pub fn num_tokens(&self, image_dims: [usize; 2]) -> usize {
        image_dims[0] * image_dims[1] + self.num_pad_tokens + self.sequence_length_graph
    }

    fn attention_lstm(
        &self,
        name: String,
        units: usize,
        d_model: usize,
        num_tokens: usize,
        return_sequences: bool,
    ) -> LayerSpec {
        LayerSpec::AttentionLstm {
            name,
            units,
            num_heads: self.num_heads,
            d_model,
            num_tokens,
            activation: self.activation.clone(),
            recurrent_activation: self.recurrent_activation.clone(),
            return_sequences,
        }
    }
}
