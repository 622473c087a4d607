//! Integration tests for the map and graph sequence loaders

use approx::assert_abs_diff_eq;
use attention_lstm_data::dates::{lookup_string, DateTriple};
use attention_lstm_data::prelude::*;
use chrono::{Duration, NaiveDate};
use ndarray::{Array3, Axis};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Ten consecutive days starting 2020-12-28, listed out of order in the metadata.
fn ten_days() -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2020, 12, 28).unwrap();
    let order = [4, 0, 9, 2, 7, 1, 8, 3, 6, 5];
    order.iter().map(|&i| start + Duration::days(i)).collect()
}

fn write_map_fixture(dir: &Path, dates: &[NaiveDate]) -> MapsConfig {
    let start = NaiveDate::from_ymd_opt(2020, 12, 28).unwrap();

    // map content and outcome both encode the chronological position
    let mut maps = Array3::<f64>::zeros((dates.len(), 6, 3));
    for (i, date) in dates.iter().enumerate() {
        let position = (*date - start).num_days() as f64;
        maps.index_axis_mut(Axis(0), i).fill(position + 1.0);
    }
    let maps_path = dir.join("maps.npy");
    ndarray_npy::write_npy(&maps_path, &maps).unwrap();

    let metadata: Vec<DateTriple> = dates
        .iter()
        .map(|d| {
            use chrono::Datelike;
            DateTriple(d.year() - 2000, d.month(), d.day())
        })
        .collect();
    let metadata_path = dir.join("metadata.json");
    fs::write(&metadata_path, serde_json::to_string(&metadata).unwrap()).unwrap();

    let mut csv = String::from("state,date,death_rate_from_population\n");
    for date in dates {
        let position = (*date - start).num_days();
        csv.push_str(&format!("US,{},{}\n", lookup_string(*date), position as f64 * 0.5));
    }
    let dataset_path = dir.join("deaths.csv");
    fs::write(&dataset_path, csv).unwrap();

    MapsConfig {
        maps_path,
        metadata_path,
        dataset_path,
        image_x: 4,
        image_y: 4,
        num_days_per_sample: 7,
        show_progress: false,
        ..MapsConfig::default()
    }
}

#[test]
fn test_map_pipeline_ten_days_seven_per_sample() {
    let dir = tempdir().unwrap();
    let config = write_map_fixture(dir.path(), &ten_days());

    let data = MapSequenceLoader::new(config).load().unwrap();

    assert_eq!(data.windows.shape(), &[3, 7]);
    assert_eq!(data.targets.shape(), &[3, 1]);
    assert_eq!(data.raw_inputs.shape(), &[10, 4, 4]);
    assert_eq!(data.image_dims(), (4, 4));

    for i in 0..3 {
        let window: Vec<usize> = data.windows.row(i).to_vec();
        assert_eq!(window, (i..i + 7).collect::<Vec<_>>());

        // chronological map k is tagged k + 1 in its centre
        for &k in &window {
            assert_abs_diff_eq!(data.raw_inputs[[k, 2, 2]], (k + 1) as f64, epsilon = 1e-9);
        }

        // target is the 8th, 9th, 10th chronological row
        assert_abs_diff_eq!(data.targets[[i, 0]], (i + 7) as f64 * 0.5);
    }

    assert_eq!(data.dates.first(), NaiveDate::from_ymd_opt(2020, 12, 28).as_ref());
    assert_eq!(data.dates.last(), NaiveDate::from_ymd_opt(2021, 1, 6).as_ref());
}

#[test]
fn test_map_pipeline_missing_metadata_date() {
    let dir = tempdir().unwrap();
    let config = write_map_fixture(dir.path(), &ten_days());

    let mut csv = fs::read_to_string(&config.dataset_path).unwrap();
    csv.push_str("US,2/1/21,1.0\n");
    fs::write(&config.dataset_path, csv).unwrap();

    let err = MapSequenceLoader::new(config).load().unwrap_err();
    assert!(matches!(err, Error::MissingDate(d) if d == "2/1/21"));
}

#[test]
fn test_generator_over_loaded_maps() {
    let dir = tempdir().unwrap();
    let config = write_map_fixture(dir.path(), &ten_days());
    let data = MapSequenceLoader::new(config).load().unwrap();

    let mut batches = BatchGenerator::with_seed(&data, 2, 11).unwrap();
    for _ in 0..9 {
        let (images, targets) = batches.next_batch();
        assert_eq!(images.shape(), &[2, 7, 4, 4]);

        for b in 0..2 {
            // first map tag is chronological index + 1; target is index + 7 halved
            let first = images[[b, 0, 2, 2]].round();
            assert_eq!(images[[b, 6, 2, 2]].round(), first + 6.0);
            assert_abs_diff_eq!(targets[[b, 0]], (first - 1.0 + 7.0) * 0.5, epsilon = 1e-6);
        }
    }

    // 18 windows consumed out of 3 per epoch
    assert_eq!(batches.epoch(), 6);
    assert_eq!(batches.cursor(), 0);
}

struct GraphFixture {
    _dir: TempDir,
    config: GraphConfig,
}

/// Three states over `flight_days` days of flights and `covid_days` days of statistics.
fn write_graph_fixture(flight_days: u32, covid_days: u32) -> GraphFixture {
    let dir = tempdir().unwrap();
    let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
    let day = |d: u32| start + Duration::days(d as i64);

    let mut flights = String::from("state_from,state_to");
    for d in 0..flight_days {
        flights.push_str(&format!(",{}", day(d).format("%Y/%m/%d")));
    }
    flights.push('\n');
    for (from, to, scale) in [("NY", "CA", 1.0), ("CA", "TX", 2.0), ("NY", "TX", 3.0)] {
        flights.push_str(&format!("{},{}", from, to));
        for d in 0..flight_days {
            flights.push_str(&format!(",{}", scale * (d + 1) as f64));
        }
        flights.push('\n');
    }
    let flight_path = dir.path().join("flights.csv");
    fs::write(&flight_path, flights).unwrap();

    // newest days first so sorting is exercised
    let mut covid = String::from(
        "state,date,Population,confirm_value,death_value,infection_rate,death_rate_from_population\n",
    );
    for d in (0..covid_days).rev() {
        for (node, state) in ["NY", "CA", "TX"].iter().enumerate() {
            covid.push_str(&format!(
                "{},{},1000,{},0,{},{}\n",
                state,
                lookup_string(day(d)),
                node,
                d,
                d as f64 / 1000.0
            ));
        }
    }
    let covid_path = dir.path().join("covid.csv");
    fs::write(&covid_path, covid).unwrap();

    GraphFixture {
        _dir: dir,
        config: GraphConfig {
            covid_path,
            flight_path,
            num_days_per_sample: 3,
            show_progress: false,
            ..GraphConfig::default()
        },
    }
}

#[test]
fn test_graph_pipeline_end_to_end() {
    // covid has two extra days without flights; they are dropped
    let fixture = write_graph_fixture(8, 10);
    let data = GraphSequenceLoader::new(fixture.config.clone()).load().unwrap();

    assert_eq!(data.len(), 5);
    assert_eq!(data.dates.len(), 8);
    assert_eq!(data.nodes, vec!["NY", "CA", "TX"]);
    assert_eq!(data.features.shape(), &[5, 3, 3, 5]);
    assert_eq!(data.adjacency.shape(), &[5, 3, 3, 3]);
    assert_eq!(data.infection_targets.shape(), &[5, 3]);
    assert_eq!(data.death_targets.shape(), &[5, 3]);

    for i in 0..5 {
        for t in 0..3 {
            let d = (i + t) as f64;
            assert_eq!(data.features[[i, t, 0, 3]], d);
            assert_eq!(data.adjacency[[i, t, 0, 1]], d + 1.0);
            assert_eq!(data.adjacency[[i, t, 2, 0]], 3.0 * (d + 1.0));
        }
        assert!(data.infection_targets.row(i).iter().all(|&v| v == (i + 3) as f64));
        assert_abs_diff_eq!(data.death_targets[[i, 1]], (i + 3) as f64 / 1000.0);
    }
}

#[test]
fn test_graph_data_filter_consistency() {
    let fixture = write_graph_fixture(8, 10);
    let config = &fixture.config;

    let data = attention_lstm_data::graph::load_graph_data(
        &config.covid_path,
        &config.flight_path,
        &config.source_column,
        &config.target_column,
    )
    .unwrap();

    assert_eq!(data.covid.len(), 24);
    assert_eq!(data.dates().len(), data.adjacency.len_of(Axis(0)));
    assert!(data.check_alignment().is_ok());
}

#[test]
fn test_graph_pipeline_flights_without_covid_days() {
    // flight columns beyond the covid data would shift adjacency against features
    let fixture = write_graph_fixture(10, 8);

    let err = GraphSequenceLoader::new(fixture.config.clone()).load().unwrap_err();
    assert!(matches!(err, Error::AdjacencyOrderMismatch { position: 8, .. }));
}

#[test]
fn test_plans_from_loaded_shapes() {
    let fixture = write_graph_fixture(8, 8);
    let data = GraphSequenceLoader::new(fixture.config.clone()).load().unwrap();

    let plan = GraphAttentionLstmConfig::default()
        .with_input_shapes(data.node_input_shape(), data.edge_input_shape())
        .plan()
        .unwrap();
    assert_eq!(plan.recurrent_layers(), 3);

    let plan = AttentionBottleneckConfig::default()
        .with_image_input(3, [16, 16])
        .with_input_shapes(data.node_input_shape(), data.edge_input_shape())
        .plan()
        .unwrap();
    assert_eq!(plan.layers.len(), 14);
}
