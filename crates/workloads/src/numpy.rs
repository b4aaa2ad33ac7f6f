// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/workloads/src/numpy.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ndarray::{ArrayD, IxDyn};
use ndarray_npy::{read_npy, write_npy};
use rand::Rng;
use tracing::debug;

use perfcapture_core::{Dataset, RunMetrics, Workload};

pub const READ_NUMPY_FILE: &str = "ReadNumpyFile";

/// 100^4 uint8 values, ~100 MB on disk.
const DEFAULT_SHAPE: [usize; 4] = [100, 100, 100, 100];

/// A single `.npy` file of uniformly random `u8` values.
#[derive(Debug, Clone)]
pub struct NumpyDataset {
    shape: Vec<usize>,
}

impl Default for NumpyDataset {
    fn default() -> Self {
        Self::new(DEFAULT_SHAPE.to_vec())
    }
}

impl NumpyDataset {
    pub fn new(shape: Vec<usize>) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn random_array(&self) -> Result<ArrayD<u8>> {
        let len = self.shape.iter().product::<usize>();
        let mut data = vec![0u8; len];
        rand::rng().fill(&mut data[..]);
        ArrayD::from_shape_vec(IxDyn(&self.shape), data).with_context(|| "Failed to reshape random array")
    }
}

impl Dataset for NumpyDataset {
    fn name(&self) -> &str {
        "NumpyDataset"
    }

    fn create(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let array = self.random_array()?;
        debug!(shape = ?self.shape, path = %path.display(), "writing numpy dataset");
        write_npy(path, &array).with_context(|| format!("Failed to write npy file at {:?}", path))?;
        Ok(())
    }
}

/// Loads the whole `.npy` file into RAM.
#[derive(Debug, Clone)]
pub struct ReadNumpyFile {
    dataset: Arc<NumpyDataset>,
    n_runs: usize,
}

impl Default for ReadNumpyFile {
    fn default() -> Self {
        Self::new(NumpyDataset::default(), 10)
    }
}

impl ReadNumpyFile {
    pub fn new(dataset: NumpyDataset, n_runs: usize) -> Self {
        Self {
            dataset: Arc::new(dataset),
            n_runs,
        }
    }
}

impl Workload for ReadNumpyFile {
    fn name(&self) -> &str {
        READ_NUMPY_FILE
    }

    fn datasets(&self) -> Vec<Arc<dyn Dataset>> {
        vec![self.dataset.clone() as Arc<dyn Dataset>]
    }

    fn run(&self, dataset_path: &Path) -> Result<RunMetrics> {
        let array: ArrayD<u8> =
            read_npy(dataset_path).with_context(|| format!("Failed to read npy file at {:?}", dataset_path))?;
        let nbytes = array.len() * std::mem::size_of::<u8>();
        Ok(RunMetrics::new(nbytes as u64))
    }

    fn n_runs(&self) -> usize {
        self.n_runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let workload = ReadNumpyFile::new(NumpyDataset::new(vec![4, 5, 6]), 2);
        let dataset = &workload.datasets()[0];
        let path = dataset.path(tmp.path());
        assert!(!dataset.already_exists(&path));
        dataset.create(&path).unwrap();
        assert!(dataset.already_exists(&path));

        let metrics = workload.run(&path).unwrap();
        assert_eq!(metrics.produced_byte_count, 120);
        assert!(metrics.elapsed_seconds.is_none());
        assert_eq!(workload.n_runs(), 2);
    }

    #[test]
    fn reading_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ReadNumpyFile::default().run(&tmp.path().join("missing.npy")).unwrap_err();
        assert!(err.to_string().contains("Failed to read npy file"));
    }
}
