//! Map-sequence loader: aligns a stack of daily maps with an outcome table.

use super::resize::resize_stack;
use crate::dates::{actual_string, lookup_string, DateTriple};
use crate::error::{Error, Result};
use crate::utils::{window_progress, MapsConfig};
use chrono::NaiveDate;
use ndarray::{Array2, Array3, Axis};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// One row of the outcome table
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRow {
    /// Date in lookup format (`m/d/yy`)
    pub date: String,
    /// Outcome value
    pub value: f64,
}

/// Windows produced by [`MapSequenceLoader`]
#[derive(Debug, Clone)]
pub struct MapSequenceData {
    /// `[n_windows, window_len]` indices into `raw_inputs`
    pub windows: Array2<usize>,
    /// `[n_windows, outcome_len]` outcome following each window
    pub targets: Array2<f64>,
    /// Resized maps `[n_dates, image_x, image_y]` in chronological order
    pub raw_inputs: Arc<Array3<f64>>,
    /// Calendar date of each entry of `raw_inputs`
    pub dates: Vec<NaiveDate>,
}

impl MapSequenceData {
    /// Number of windows
    pub fn len(&self) -> usize {
        self.windows.nrows()
    }

    /// True when no window could be built
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Window length
    pub fn window_len(&self) -> usize {
        self.windows.ncols()
    }

    /// `(image_x, image_y)` of the resized maps
    pub fn image_dims(&self) -> (usize, usize) {
        let (_, h, w) = self.raw_inputs.dim();
        (h, w)
    }
}

/// Builds sliding windows over chronologically ordered maps
#[derive(Debug, Clone)]
pub struct MapSequenceLoader {
    config: MapsConfig,
}

impl MapSequenceLoader {
    /// Create a loader from its configuration
    pub fn new(config: MapsConfig) -> Self {
        Self { config }
    }

    /// Loader configuration
    pub fn config(&self) -> &MapsConfig {
        &self.config
    }

    /// Read the maps, metadata and outcome table named in the configuration and build windows.
    pub fn load(&self) -> Result<MapSequenceData> {
        let maps = read_maps(&self.config.maps_path)?;
        let metadata = read_metadata(&self.config.metadata_path)?;
        let outcomes = read_outcome_table(&self.config.dataset_path, &self.config.outcome_column)?;

        info!(
            "Loaded {} maps, {} metadata entries and {} outcome rows",
            maps.len_of(Axis(0)),
            metadata.len(),
            outcomes.len()
        );

        self.from_parts(maps, &metadata, &outcomes)
    }

    /// Build windows from in-memory maps, metadata triples and outcome rows.
    pub fn from_parts(
        &self,
        maps: Array3<f64>,
        metadata: &[DateTriple],
        outcomes: &[OutcomeRow],
    ) -> Result<MapSequenceData> {
        let window_len = self.config.num_days_per_sample;
        if window_len == 0 {
            return Err(Error::InvalidConfig(
                "num_days_per_sample must be at least 1".to_string(),
            ));
        }

        let n_maps = maps.len_of(Axis(0));
        if n_maps != metadata.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} maps but {} metadata entries",
                n_maps,
                metadata.len()
            )));
        }

        let dates = metadata
            .iter()
            .map(|triple| triple.to_date())
            .collect::<Result<Vec<NaiveDate>>>()?;

        let lookup: Vec<String> = dates.iter().map(|d| lookup_string(*d)).collect();
        let map_index: HashMap<&str, usize> = lookup
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        // Every outcome row must resolve to a map; values are grouped by date string.
        let mut values_by_date: HashMap<&str, Vec<f64>> = HashMap::new();
        for row in outcomes {
            let date = row.date.trim();
            let index = map_index
                .get(date)
                .ok_or_else(|| Error::MissingDate(row.date.clone()))?;
            values_by_date
                .entry(lookup[*index].as_str())
                .or_default()
                .push(row.value);
        }

        let actual: Vec<String> = dates.iter().map(|d| actual_string(*d)).collect();
        let mut order: Vec<usize> = (0..n_maps).collect();
        order.sort_by(|&a, &b| actual[a].cmp(&actual[b]));

        let series: Vec<Vec<f64>> = order
            .iter()
            .map(|&i| {
                values_by_date
                    .get(lookup[i].as_str())
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        let outcome_len = series.first().map_or(0, Vec::len);
        if let Some(pos) = series.iter().position(|v| v.len() != outcome_len) {
            return Err(Error::ShapeMismatch(format!(
                "date {} has {} outcome rows, expected {}",
                lookup[order[pos]],
                series[pos].len(),
                outcome_len
            )));
        }

        debug!("Resizing {} maps to {}x{}", n_maps, self.config.image_x, self.config.image_y);
        let chronological = maps.select(Axis(0), &order);
        let raw_inputs = resize_stack(&chronological, self.config.image_x, self.config.image_y);

        let n_windows = n_maps.saturating_sub(window_len);
        let pb = window_progress(n_windows, "Building map windows", self.config.show_progress);

        let windows = Array2::from_shape_fn((n_windows, window_len), |(i, t)| i + t);
        let mut targets = Array2::zeros((n_windows, outcome_len));
        for (i, mut target) in targets.axis_iter_mut(Axis(0)).enumerate() {
            for (dst, &v) in target.iter_mut().zip(&series[i + window_len]) {
                *dst = v;
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            "Built {} map windows of {} days ({} outcome values each)",
            n_windows, window_len, outcome_len
        );

        Ok(MapSequenceData {
            windows,
            targets,
            raw_inputs: Arc::new(raw_inputs),
            dates: order.iter().map(|&i| dates[i]).collect(),
        })
    }
}

/// Read a `[n, h, w]` map stack stored as `f64` or `f32`.
pub fn read_maps(path: impl AsRef<Path>) -> Result<Array3<f64>> {
    let path = path.as_ref();

    match ndarray_npy::read_npy::<_, Array3<f64>>(path) {
        Ok(maps) => Ok(maps),
        Err(ndarray_npy::ReadNpyError::WrongDescriptor(_)) => {
            debug!("{} is not f64, reading as f32", path.display());
            let maps: Array3<f32> = ndarray_npy::read_npy(path)?;
            Ok(maps.mapv(f64::from))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read the JSON list of `[year_suffix, month, day]` triples.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<Vec<DateTriple>> {
    let file = File::open(path)?;
    let metadata = serde_json::from_reader(BufReader::new(file))?;
    Ok(metadata)
}

/// Read `date` and `column` from the outcome table at `path`.
pub fn read_outcome_table(path: impl AsRef<Path>, column: &str) -> Result<Vec<OutcomeRow>> {
    let file = File::open(path)?;
    read_outcome_rows(file, column)
}

/// Read `date` and `column` from CSV data; other columns are ignored.
pub fn read_outcome_rows<R: Read>(reader: R, column: &str) -> Result<Vec<OutcomeRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    };
    let date_idx = position("date")?;
    let value_idx = position(column)?;

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let date = record.get(date_idx).unwrap_or_default().to_string();
        let raw = record.get(value_idx).unwrap_or_default();
        let value = raw.trim().parse::<f64>().map_err(|_| Error::InvalidValue {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        })?;

        rows.push(OutcomeRow { date, value });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(window: usize) -> MapSequenceLoader {
        MapSequenceLoader::new(MapsConfig {
            image_x: 4,
            image_y: 4,
            num_days_per_sample: window,
            show_progress: false,
            ..MapsConfig::default()
        })
    }

    /// Metadata out of calendar order: day 3, 1, 2, 4, ...
    fn shuffled_days(n: u32) -> Vec<DateTriple> {
        let mut days: Vec<u32> = (1..=n).collect();
        days.swap(0, 2);
        days.swap(1, 2);
        days.into_iter().map(|d| DateTriple(20, 4, d)).collect()
    }

    fn maps_tagged_by_day(metadata: &[DateTriple]) -> Array3<f64> {
        let mut maps = Array3::zeros((metadata.len(), 4, 4));
        for (i, triple) in metadata.iter().enumerate() {
            maps.index_axis_mut(Axis(0), i).fill(triple.2 as f64);
        }
        maps
    }

    fn outcomes_for(metadata: &[DateTriple]) -> Vec<OutcomeRow> {
        metadata
            .iter()
            .map(|t| OutcomeRow {
                date: format!("{}/{}/{}", t.1, t.2, t.0),
                value: t.2 as f64 * 10.0,
            })
            .collect()
    }

    #[test]
    fn test_window_count() {
        let metadata = shuffled_days(12);
        let maps = maps_tagged_by_day(&metadata);
        let outcomes = outcomes_for(&metadata);

        for window in [1, 5, 11, 12, 20] {
            let data = loader(window).from_parts(maps.clone(), &metadata, &outcomes).unwrap();
            assert_eq!(data.len(), 12usize.saturating_sub(window));
            assert_eq!(data.targets.nrows(), data.len());
        }
    }

    #[test]
    fn test_targets_follow_chronological_order() {
        let metadata = shuffled_days(6);
        let maps = maps_tagged_by_day(&metadata);
        let outcomes = outcomes_for(&metadata);

        let data = loader(3).from_parts(maps, &metadata, &outcomes).unwrap();

        assert_eq!(data.len(), 3);
        for i in 0..data.len() {
            // raw_inputs is chronological, so map i carries day i + 1
            let first = data.windows[[i, 0]];
            assert_eq!(data.raw_inputs[[first, 0, 0]], (i + 1) as f64);
            assert_eq!(data.targets[[i, 0]], ((i + 4) * 10) as f64);
        }
        assert!(data.dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_date_is_fatal() {
        let metadata = shuffled_days(8);
        let maps = maps_tagged_by_day(&metadata);
        let mut outcomes = outcomes_for(&metadata);
        outcomes.push(OutcomeRow {
            date: "5/1/20".to_string(),
            value: 1.0,
        });

        let err = loader(3).from_parts(maps, &metadata, &outcomes).unwrap_err();
        assert!(matches!(err, Error::MissingDate(d) if d == "5/1/20"));
    }

    #[test]
    fn test_map_metadata_length_mismatch() {
        let metadata = shuffled_days(8);
        let maps = Array3::zeros((7, 4, 4));

        let err = loader(3).from_parts(maps, &metadata, &[]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn test_malformed_metadata_is_fatal() {
        let metadata = vec![DateTriple(20, 13, 1), DateTriple(20, 1, 1)];
        let maps = Array3::zeros((2, 4, 4));

        let err = loader(1).from_parts(maps, &metadata, &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidDate(_)));
    }

    #[test]
    fn test_ragged_outcomes_rejected() {
        let metadata = shuffled_days(5);
        let maps = maps_tagged_by_day(&metadata);
        let mut outcomes = outcomes_for(&metadata);
        outcomes.pop();

        let err = loader(2).from_parts(maps, &metadata, &outcomes).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = loader(0).from_parts(Array3::zeros((0, 4, 4)), &[], &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_read_outcome_rows() {
        let csv = "state,date,death_rate_from_population\nNY,3/5/20,0.5\nNY,3/6/20,0.75\n";
        let rows = read_outcome_rows(csv.as_bytes(), "death_rate_from_population").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].date, "3/6/20");
        assert_eq!(rows[1].value, 0.75);

        let missing = read_outcome_rows(csv.as_bytes(), "infection_rate").unwrap_err();
        assert!(matches!(missing, Error::MissingColumn(c) if c == "infection_rate"));

        let bad = "date,death_rate_from_population\n3/5/20,n/a\n";
        let err = read_outcome_rows(bad.as_bytes(), "death_rate_from_population").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { row: 0, .. }));
    }

    #[test]
    fn test_read_maps_widens_f32() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps_f32.npy");
        let maps = Array3::<f32>::from_shape_fn((2, 3, 3), |(n, y, x)| {
            n as f32 + 0.25 * (y * 3 + x) as f32
        });
        ndarray_npy::write_npy(&path, &maps).unwrap();

        let read = read_maps(&path).unwrap();

        assert_eq!(read.shape(), &[2, 3, 3]);
        assert_eq!(read, maps.mapv(f64::from));
    }

    #[test]
    fn test_read_maps_f64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps.npy");
        let maps = Array3::<f64>::from_elem((1, 2, 2), 0.1);
        ndarray_npy::write_npy(&path, &maps).unwrap();

        assert_eq!(read_maps(&path).unwrap(), maps);
    }
}
