//! Graph-sequence loader: daily node features paired with daily flight adjacency.

use super::covid::{read_covid_table, CovidRow, DEATH_RATE, FEATURE_COLUMNS, INFECTION_RATE};
use super::flights::{read_flight_table, FlightEdges};
use crate::dates::actual_string;
use crate::error::{Error, Result};
use crate::utils::{window_progress, GraphConfig};
use chrono::NaiveDate;
use ndarray::{s, Array2, Array3, Array4, Axis};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Covid rows restricted to days with flight data, plus one adjacency matrix per flight day
#[derive(Debug, Clone)]
pub struct GraphData {
    /// `[flight_dates, nodes, nodes]`, in flight-table column order
    pub adjacency: Array3<f64>,
    /// Date of each adjacency matrix
    pub adjacency_dates: Vec<NaiveDate>,
    /// Node labels in adjacency order
    pub nodes: Vec<String>,
    /// Covid rows whose date has a flight column, in file order
    pub covid: Vec<CovidRow>,
}

impl GraphData {
    /// Filter covid rows to the flight days and build the daily adjacency matrices.
    pub fn new(covid: Vec<CovidRow>, flights: &FlightEdges) -> Self {
        let flight_dates: HashSet<NaiveDate> = flights.dates.iter().copied().collect();

        let total = covid.len();
        let covid: Vec<CovidRow> = covid
            .into_iter()
            .filter(|row| flight_dates.contains(&row.date))
            .collect();
        if covid.len() < total {
            debug!(
                "Dropped {} covid rows dated outside the flight data",
                total - covid.len()
            );
        }

        Self {
            adjacency: flights.adjacency_matrices(),
            adjacency_dates: flights.dates.clone(),
            nodes: flights.nodes(),
            covid,
        }
    }

    /// Sorted unique dates of the retained covid rows
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.covid.iter().map(|row| row.date).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Fail unless adjacency matrix `i` belongs to the `i`-th retained covid date.
    pub fn check_alignment(&self) -> Result<()> {
        let dates = self.dates();
        let len = dates.len().max(self.adjacency_dates.len());

        for position in 0..len {
            let adjacency = self.adjacency_dates.get(position);
            let covid = dates.get(position);

            if adjacency != covid {
                let show = |d: Option<&NaiveDate>| {
                    d.map_or_else(|| "nothing".to_string(), |d| actual_string(*d))
                };
                return Err(Error::AdjacencyOrderMismatch {
                    position,
                    adjacency: show(adjacency),
                    covid: show(covid),
                });
            }
        }

        Ok(())
    }
}

/// Load the covid and flight tables and align them by date.
pub fn load_graph_data(
    covid_path: impl AsRef<Path>,
    flight_path: impl AsRef<Path>,
    source_column: &str,
    target_column: &str,
) -> Result<GraphData> {
    let flights = read_flight_table(flight_path, source_column, target_column)?;
    let covid = read_covid_table(covid_path)?;

    info!(
        "Loaded {} covid rows and {} flight routes over {} days",
        covid.len(),
        flights.edges.len(),
        flights.dates.len()
    );

    Ok(GraphData::new(covid, &flights))
}

/// Windows produced by [`GraphSequenceLoader`]
#[derive(Debug, Clone)]
pub struct GraphSequenceData {
    /// `[n_windows, window_len, nodes, 5]` node features
    pub features: Array4<f64>,
    /// `[n_windows, window_len, nodes, nodes]` adjacency matrices
    pub adjacency: Array4<f64>,
    /// `[n_windows, nodes]` infection rate on the day after each window
    pub infection_targets: Array2<f64>,
    /// `[n_windows, nodes]` death rate on the day after each window
    pub death_targets: Array2<f64>,
    /// Sorted retained dates the windows slide over
    pub dates: Vec<NaiveDate>,
    /// Node labels in adjacency order
    pub nodes: Vec<String>,
}

impl GraphSequenceData {
    /// Number of windows
    pub fn len(&self) -> usize {
        self.features.len_of(Axis(0))
    }

    /// True when no window could be built
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-sample node feature shape `[window_len, nodes, features]`
    pub fn node_input_shape(&self) -> Vec<usize> {
        self.features.shape()[1..].to_vec()
    }

    /// Per-sample adjacency shape `[window_len, nodes, nodes]`
    pub fn edge_input_shape(&self) -> Vec<usize> {
        self.adjacency.shape()[1..].to_vec()
    }
}

/// Builds sliding windows over aligned graph data
#[derive(Debug, Clone)]
pub struct GraphSequenceLoader {
    config: GraphConfig,
}

impl GraphSequenceLoader {
    /// Create a loader from its configuration
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Loader configuration
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Read the tables named in the configuration and build windows.
    pub fn load(&self) -> Result<GraphSequenceData> {
        let data = load_graph_data(
            &self.config.covid_path,
            &self.config.flight_path,
            &self.config.source_column,
            &self.config.target_column,
        )?;

        self.from_graph_data(&data)
    }

    /// Build windows from already aligned graph data.
    pub fn from_graph_data(&self, data: &GraphData) -> Result<GraphSequenceData> {
        let window_len = self.config.num_days_per_sample;
        if window_len == 0 {
            return Err(Error::InvalidConfig(
                "num_days_per_sample must be at least 1".to_string(),
            ));
        }

        data.check_alignment()?;

        let mut days: BTreeMap<NaiveDate, Vec<&CovidRow>> = BTreeMap::new();
        for row in &data.covid {
            days.entry(row.date).or_default().push(row);
        }
        let dates: Vec<NaiveDate> = days.keys().copied().collect();
        let rows: Vec<Vec<&CovidRow>> = days.into_values().collect();

        let n_rows = rows.first().map_or(0, Vec::len);
        if let Some(pos) = rows.iter().position(|day| day.len() != n_rows) {
            return Err(Error::ShapeMismatch(format!(
                "{} has {} node rows, expected {}",
                actual_string(dates[pos]),
                rows[pos].len(),
                n_rows
            )));
        }
        if !rows.is_empty() && n_rows != data.nodes.len() {
            warn!(
                "Covid data has {} rows per day but the flight graph has {} nodes",
                n_rows,
                data.nodes.len()
            );
        }

        let n_nodes = data.nodes.len();
        let n_windows = dates.len().saturating_sub(window_len);
        let n_features = FEATURE_COLUMNS.len();

        let mut features = Array4::zeros((n_windows, window_len, n_rows, n_features));
        let mut adjacency = Array4::zeros((n_windows, window_len, n_nodes, n_nodes));
        let mut infection_targets = Array2::zeros((n_windows, n_rows));
        let mut death_targets = Array2::zeros((n_windows, n_rows));

        let pb = window_progress(n_windows, "Building graph windows", self.config.show_progress);
        for i in 0..n_windows {
            for t in 0..window_len {
                for (node, row) in rows[i + t].iter().enumerate() {
                    for (f, &value) in row.features.iter().enumerate() {
                        features[[i, t, node, f]] = value;
                    }
                }
            }

            adjacency
                .slice_mut(s![i, .., .., ..])
                .assign(&data.adjacency.slice(s![i..i + window_len, .., ..]));

            for (node, row) in rows[i + window_len].iter().enumerate() {
                infection_targets[[i, node]] = row.features[INFECTION_RATE];
                death_targets[[i, node]] = row.features[DEATH_RATE];
            }

            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            "Built {} graph windows of {} days over {} nodes",
            n_windows, window_len, n_nodes
        );

        Ok(GraphSequenceData {
            features,
            adjacency,
            infection_targets,
            death_targets,
            dates,
            nodes: data.nodes.clone(),
        })
    }
}
