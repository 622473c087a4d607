//! Graph attention LSTM plan

use super::layers::{LayerPlan, LayerSpec};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Stacked multi-head graph attention LSTMs over node and adjacency sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphAttentionLstmConfig {
    /// Units of each recurrent layer; the last entry is the output layer
    pub layer_units: Vec<usize>,
    /// Attention heads per layer
    pub num_heads: usize,
    /// Per-sample node input shape `[window_len, nodes, features]`
    pub input_shape_nodes: Vec<usize>,
    /// Per-sample adjacency input shape `[window_len, nodes, nodes]`
    pub input_shape_edges: Vec<usize>,
    /// Number of graph nodes seen by each cell
    pub sequence_length: usize,
    /// Output size of the hidden layers
    pub hidden_size: usize,
    pub residual: bool,
    pub use_bias: bool,
    pub concat_output: bool,
    /// One output per node when true, otherwise averaged `[nodes, nodes]` output
    pub seq_wise_output: bool,
    pub name: String,
}

impl Default for GraphAttentionLstmConfig {
    fn default() -> Self {
        Self {
            layer_units: vec![64, 64, 32],
            num_heads: 4,
            input_shape_nodes: vec![7, 49, 5],
            input_shape_edges: vec![7, 49, 49],
            sequence_length: 49,
            hidden_size: 32,
            residual: true,
            use_bias: true,
            concat_output: false,
            seq_wise_output: true,
            name: "GraphAttentionLSTMModel".to_string(),
        }
    }
}

impl GraphAttentionLstmConfig {
    /// Take input shapes and node count from loaded windows.
    pub fn with_input_shapes(mut self, nodes: Vec<usize>, edges: Vec<usize>) -> Self {
        if let Some(&n) = nodes.get(1) {
            self.sequence_length = n;
        }
        self.input_shape_nodes = nodes;
        self.input_shape_edges = edges;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.layer_units.is_empty() {
            return Err(Error::InvalidConfig("layer_units must not be empty".to_string()));
        }
        if self.num_heads == 0 {
            return Err(Error::InvalidConfig("num_heads must be at least 1".to_string()));
        }
        if self.input_shape_nodes.len() != 3 || self.input_shape_edges.len() != 3 {
            return Err(Error::InvalidConfig(format!(
                "input shapes must be [window, nodes, _], got {:?} and {:?}",
                self.input_shape_nodes, self.input_shape_edges
            )));
        }
        if self.input_shape_nodes[..2] != self.input_shape_edges[..2] {
            return Err(Error::InvalidConfig(format!(
                "node input {:?} and edge input {:?} disagree on window or node count",
                self.input_shape_nodes, self.input_shape_edges
            )));
        }
        Ok(())
    }

    /// Validated layer plan.
    pub fn plan(&self) -> Result<LayerPlan> {
        self.validate()?;

        let mut layers = vec![
            LayerSpec::Input {
                name: format!("{}_nodes", self.name),
                shape: self.input_shape_nodes.clone(),
            },
            LayerSpec::Input {
                name: format!("{}_adjacency", self.name),
                shape: self.input_shape_edges.clone(),
            },
        ];

        let (hidden, last) = self.layer_units.split_at(self.layer_units.len() - 1);
        for (i, &units) in hidden.iter().enumerate() {
            layers.push(LayerSpec::GraphAttentionLstm {
                name: format!("{}_cell_{}", self.name, i),
                units,
                num_heads: self.num_heads,
                sequence_length: self.sequence_length,
                output_size: self.hidden_size,
                residual: self.residual,
                concat_output: self.concat_output,
                use_bias: self.use_bias,
                return_sequences: true,
            });
        }

        layers.push(LayerSpec::GraphAttentionLstm {
            name: format!("{}_cell_out", self.name),
            units: last[0],
            num_heads: self.num_heads,
            sequence_length: self.sequence_length,
            output_size: if self.seq_wise_output { 1 } else { self.sequence_length },
            residual: true,
            concat_output: false,
            use_bias: true,
            return_sequences: false,
        });

        if !self.seq_wise_output {
            layers.push(LayerSpec::ReduceMean { axis: -2 });
        }

        Ok(LayerPlan {
            name: self.name.clone(),
            layers,
        })
    }
}
