//! Per-node covid statistics table

use crate::dates::parse_lookup;
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Node feature columns, in the order they appear in feature arrays
pub const FEATURE_COLUMNS: [&str; 5] = [
    "Population",
    "confirm_value",
    "death_value",
    "infection_rate",
    "death_rate_from_population",
];

/// Position of `infection_rate` in [`FEATURE_COLUMNS`]
pub const INFECTION_RATE: usize = 3;

/// Position of `death_rate_from_population` in [`FEATURE_COLUMNS`]
pub const DEATH_RATE: usize = 4;

#[derive(Debug, Deserialize)]
struct CovidRecord {
    date: String,
    #[serde(rename = "Population", deserialize_with = "zero_if_empty")]
    population: f64,
    #[serde(deserialize_with = "zero_if_empty")]
    confirm_value: f64,
    #[serde(deserialize_with = "zero_if_empty")]
    death_value: f64,
    #[serde(deserialize_with = "zero_if_empty")]
    infection_rate: f64,
    #[serde(deserialize_with = "zero_if_empty")]
    death_rate_from_population: f64,
}

/// Empty cells read as 0, the same as empty flight weights.
fn zero_if_empty<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// One node's statistics on one day
#[derive(Debug, Clone, PartialEq)]
pub struct CovidRow {
    /// Calendar date of the observation
    pub date: NaiveDate,
    /// Values of [`FEATURE_COLUMNS`]
    pub features: [f64; 5],
}

impl CovidRow {
    /// Daily infection rate
    pub fn infection_rate(&self) -> f64 {
        self.features[INFECTION_RATE]
    }

    /// Deaths relative to population
    pub fn death_rate(&self) -> f64 {
        self.features[DEATH_RATE]
    }

    fn from_record(record: CovidRecord) -> Result<Self> {
        Ok(Self {
            date: parse_lookup(&record.date)?,
            features: [
                record.population,
                record.confirm_value,
                record.death_value,
                record.infection_rate,
                record.death_rate_from_population,
            ],
        })
    }
}

/// Read the covid statistics table at `path`.
pub fn read_covid_table(path: impl AsRef<Path>) -> Result<Vec<CovidRow>> {
    let file = File::open(path)?;
    read_covid_rows(file)
}

/// Read covid statistics from CSV data; columns other than `date` and the features are ignored.
pub fn read_covid_rows<R: Read>(reader: R) -> Result<Vec<CovidRow>> {
    let mut reader = csv::Reader::from_reader(reader);

    reader
        .deserialize::<CovidRecord>()
        .map(|record| CovidRow::from_record(record?))
        .collect()
}
