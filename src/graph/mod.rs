//! Graph-sequence data: per-node covid statistics over daily flight graphs.
//!
//! - `covid` - per-node statistics table
//! - `flights` - flight edge list and daily adjacency matrices
//! - `loader` - date filtering, alignment checks and sliding windows

mod covid;
mod flights;
mod loader;

pub use covid::{
    read_covid_rows, read_covid_table, CovidRow, DEATH_RATE, FEATURE_COLUMNS, INFECTION_RATE,
};
pub use flights::{read_flight_edges, read_flight_table, FlightEdge, FlightEdges};
pub use loader::{load_graph_data, GraphData, GraphSequenceData, GraphSequenceLoader};
