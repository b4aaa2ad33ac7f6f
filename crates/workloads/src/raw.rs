// crates/workloads/src/raw.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::Rng;

use perfcapture_core::{Dataset, RunMetrics, Workload};

pub const READ_RAW_FILE: &str = "ReadRawFile";

/// A flat file of random bytes.
#[derive(Debug, Clone)]
pub struct RawDataset {
    size_bytes: usize,
}

impl Default for RawDataset {
    fn default() -> Self {
        Self::new(64 * 1024 * 1024)
    }
}

impl RawDataset {
    pub fn new(size_bytes: usize) -> Self {
        Self { size_bytes }
    }
}

impl Dataset for RawDataset {
    fn name(&self) -> &str {
        "RawDataset"
    }

    fn create(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut data = vec![0u8; self.size_bytes];
        rand::rng().fill(&mut data[..]);
        std::fs::write(path, data).with_context(|| format!("Failed to write raw file at {:?}", path))
    }
}

/// Reads the whole file with a single `read`.
#[derive(Debug, Clone)]
pub struct ReadRawFile {
    dataset: Arc<RawDataset>,
    n_runs: usize,
}

impl Default for ReadRawFile {
    fn default() -> Self {
        Self::new(RawDataset::default(), 5)
    }
}

impl ReadRawFile {
    pub fn new(dataset: RawDataset, n_runs: usize) -> Self {
        Self {
            dataset: Arc::new(dataset),
            n_runs,
        }
    }
}

impl Workload for ReadRawFile {
    fn name(&self) -> &str {
        READ_RAW_FILE
    }

    fn datasets(&self) -> Vec<Arc<dyn Dataset>> {
        vec![self.dataset.clone() as Arc<dyn Dataset>]
    }

    fn run(&self, dataset_path: &Path) -> Result<RunMetrics> {
        let data = std::fs::read(dataset_path).with_context(|| format!("Failed to read {:?}", dataset_path))?;
        Ok(RunMetrics::new(data.len() as u64))
    }

    fn n_runs(&self) -> usize {
        self.n_runs
    }
}
