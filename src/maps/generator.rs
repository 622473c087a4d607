//! Infinite batch generator over map windows.
//!
//! The generator walks a cursor over the windows, copying the referenced maps into
//! fixed-size batches. Whenever the cursor runs past the last window it wraps to zero
//! and windows and targets are reordered by one shared random permutation, so every
//! window keeps its own target.

use super::loader::MapSequenceData;
use crate::error::{Error, Result};
use ndarray::{s, Array2, Array3, Array4, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::debug;

/// Batch of `[batch, window_len, image_x, image_y]` maps and `[batch, outcome_len]` targets
pub type MapBatch = (Array4<f32>, Array2<f32>);

/// Stateful, single-consumer producer of map batches
#[derive(Debug, Clone)]
pub struct BatchGenerator {
    windows: Array2<usize>,
    targets: Array2<f64>,
    raw_inputs: Arc<Array3<f64>>,
    batch_size: usize,
    cursor: usize,
    epoch: usize,
    rng: StdRng,
}

impl BatchGenerator {
    /// Create a generator over loaded map windows, shuffling with an entropy seed.
    pub fn new(data: &MapSequenceData, batch_size: usize) -> Result<Self> {
        Self::from_parts(
            data.windows.clone(),
            data.targets.clone(),
            Arc::clone(&data.raw_inputs),
            batch_size,
            StdRng::from_entropy(),
        )
    }

    /// Create a generator whose epoch shuffles are reproducible.
    pub fn with_seed(data: &MapSequenceData, batch_size: usize, seed: u64) -> Result<Self> {
        Self::from_parts(
            data.windows.clone(),
            data.targets.clone(),
            Arc::clone(&data.raw_inputs),
            batch_size,
            StdRng::seed_from_u64(seed),
        )
    }

    fn from_parts(
        windows: Array2<usize>,
        targets: Array2<f64>,
        raw_inputs: Arc<Array3<f64>>,
        batch_size: usize,
        rng: StdRng,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        if windows.nrows() == 0 {
            return Err(Error::InsufficientData(
                "no windows to draw batches from".to_string(),
            ));
        }
        if windows.nrows() != targets.nrows() {
            return Err(Error::ShapeMismatch(format!(
                "{} windows but {} targets",
                windows.nrows(),
                targets.nrows()
            )));
        }
        let n_maps = raw_inputs.len_of(Axis(0));
        if let Some(&idx) = windows.iter().find(|&&idx| idx >= n_maps) {
            return Err(Error::ShapeMismatch(format!(
                "window references map {} but only {} maps exist",
                idx, n_maps
            )));
        }

        Ok(Self {
            windows,
            targets,
            raw_inputs,
            batch_size,
            cursor: 0,
            epoch: 0,
            rng,
        })
    }

    /// Assemble the next batch, advancing the cursor by `batch_size` windows.
    pub fn next_batch(&mut self) -> MapBatch {
        let window_len = self.windows.ncols();
        let (_, height, width) = self.raw_inputs.dim();

        let mut images = Array4::<f32>::zeros((self.batch_size, window_len, height, width));
        let mut targets = Array2::<f32>::zeros((self.batch_size, self.targets.ncols()));

        for b in 0..self.batch_size {
            for (t, &idx) in self.windows.row(self.cursor).iter().enumerate() {
                images
                    .slice_mut(s![b, t, .., ..])
                    .assign(&self.raw_inputs.index_axis(Axis(0), idx).mapv(|v| v as f32));
            }
            targets
                .row_mut(b)
                .assign(&self.targets.row(self.cursor).mapv(|v| v as f32));

            self.cursor += 1;
            if self.cursor >= self.windows.nrows() {
                self.cursor = 0;
                self.reshuffle();
            }
        }

        (images, targets)
    }

    fn reshuffle(&mut self) {
        let mut permutation: Vec<usize> = (0..self.windows.nrows()).collect();
        permutation.shuffle(&mut self.rng);

        self.windows = self.windows.select(Axis(0), &permutation);
        self.targets = self.targets.select(Axis(0), &permutation);
        self.epoch += 1;

        debug!("Epoch {} finished, reshuffled {} windows", self.epoch, permutation.len());
    }

    /// Position of the next window to be consumed
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of completed passes over the windows
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Windows in their current order
    pub fn windows(&self) -> &Array2<usize> {
        &self.windows
    }

    /// Targets in their current order
    pub fn targets(&self) -> &Array2<f64> {
        &self.targets
    }

    /// Windows per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Iterator for BatchGenerator {
    type Item = MapBatch;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}
