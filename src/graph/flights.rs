//! Flight edge list with one weight column per day, and the adjacency matrices built from it.

use crate::dates::parse_actual;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use ndarray::{Array2, Array3, Axis};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One route with its daily flight volumes
#[derive(Debug, Clone, PartialEq)]
pub struct FlightEdge {
    pub source: String,
    pub target: String,
    /// One weight per entry of [`FlightEdges::dates`]
    pub weights: Vec<f64>,
}

/// Edge list of the flight table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightEdges {
    /// Date of each weight column, in file order
    pub dates: Vec<NaiveDate>,
    pub edges: Vec<FlightEdge>,
}

impl FlightEdges {
    /// Node labels in graph order: first appearance in the edge list, source before target.
    pub fn nodes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();

        for edge in &self.edges {
            for name in [&edge.source, &edge.target] {
                if seen.insert(name.as_str()) {
                    nodes.push(name.clone());
                }
            }
        }

        nodes
    }

    /// Undirected graph for the weight column `column`.
    ///
    /// A route listed more than once (in either direction) keeps the last weight.
    pub fn graph(&self, column: usize) -> UnGraph<String, f64> {
        let mut graph = UnGraph::new_undirected();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();

        for edge in &self.edges {
            let a = *index
                .entry(edge.source.as_str())
                .or_insert_with(|| graph.add_node(edge.source.clone()));
            let b = *index
                .entry(edge.target.as_str())
                .or_insert_with(|| graph.add_node(edge.target.clone()));
            let weight = edge.weights.get(column).copied().unwrap_or(0.0);

            graph.update_edge(a, b, weight);
        }

        graph
    }

    /// Dense symmetric adjacency matrix for the weight column `column`.
    pub fn adjacency_matrix(&self, column: usize) -> Array2<f64> {
        let graph = self.graph(column);
        let n = graph.node_count();
        let mut matrix = Array2::zeros((n, n));

        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            matrix[[a, b]] = *edge.weight();
            matrix[[b, a]] = *edge.weight();
        }

        matrix
    }

    /// `[dates, nodes, nodes]` stack with one adjacency matrix per weight column, in column order.
    pub fn adjacency_matrices(&self) -> Array3<f64> {
        let n = self.nodes().len();
        let mut stack = Array3::zeros((self.dates.len(), n, n));

        for (column, mut slot) in stack.axis_iter_mut(Axis(0)).enumerate() {
            slot.assign(&self.adjacency_matrix(column));
        }

        stack
    }
}

/// Read the flight table at `path`.
pub fn read_flight_table(
    path: impl AsRef<Path>,
    source_column: &str,
    target_column: &str,
) -> Result<FlightEdges> {
    let file = File::open(path)?;
    read_flight_edges(file, source_column, target_column)
}

/// Read a flight edge list from CSV data.
///
/// Every column other than the source and target columns is a `YYYY/MM/DD` date whose
/// cells are that day's flight volume. Empty cells count as zero.
pub fn read_flight_edges<R: Read>(
    reader: R,
    source_column: &str,
    target_column: &str,
) -> Result<FlightEdges> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    };
    let source_idx = position(source_column)?;
    let target_idx = position(target_column)?;

    let date_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != source_idx && *i != target_idx)
        .collect();
    let dates = date_columns
        .iter()
        .map(|(_, h)| parse_actual(h))
        .collect::<Result<Vec<NaiveDate>>>()?;

    let mut edges = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;

        let weights = date_columns
            .iter()
            .map(|&(i, header)| {
                let raw = record.get(i).unwrap_or_default().trim();
                if raw.is_empty() {
                    return Ok(0.0);
                }
                raw.parse::<f64>().map_err(|_| Error::InvalidValue {
                    column: header.to_string(),
                    row,
                    value: raw.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        edges.push(FlightEdge {
            source: record.get(source_idx).unwrap_or_default().trim().to_string(),
            target: record.get(target_idx).unwrap_or_default().trim().to_string(),
            weights,
        });
    }

    Ok(FlightEdges { dates, edges })
}
