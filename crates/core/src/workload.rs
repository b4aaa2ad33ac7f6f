// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/workload.rs
//
// Workload and Dataset plugins, and the explicit registry the CLI picks them from.
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::metrics::RunMetrics;
use crate::{PerfError, Result};

/// Data a workload reads. Stored at `<data_path>/<name>`.
pub trait Dataset: Send + Sync {
    /// Unique across the benchmark suite.
    fn name(&self) -> &str;

    /// Create the dataset at `path`. Never timed.
    fn create(&self, path: &Path) -> anyhow::Result<()>;

    /// True if a non-empty directory or any file already sits at `path`.
    fn already_exists(&self, path: &Path) -> bool {
        if path.is_dir() {
            path_not_empty(path)
        } else {
            path.exists()
        }
    }

    fn path(&self, data_path: &Path) -> PathBuf {
        data_path.join(self.name())
    }
}

/// A repeatable operation to benchmark against one or more datasets.
pub trait Workload {
    /// Unique across the benchmark suite.
    fn name(&self) -> &str;

    fn datasets(&self) -> Vec<Arc<dyn Dataset>>;

    /// Run once against `dataset_path`. Only `produced_byte_count` is read
    /// from the returned metrics; the manager fills in the rest.
    fn run(&self, dataset_path: &Path) -> anyhow::Result<RunMetrics>;

    /// Number of timed runs per dataset.
    fn n_runs(&self) -> usize {
        1
    }
}

/// True if `path` is a directory with at least one entry.
pub fn path_not_empty(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Create every dataset used by `workloads` that is not on disk yet.
/// Datasets shared between workloads (same name) are handled once.
pub fn create_datasets_if_necessary(workloads: &[Box<dyn Workload>], data_path: &Path) -> Result<()> {
    let mut seen = HashSet::new();
    let datasets: Vec<_> = workloads
        .iter()
        .flat_map(|w| w.datasets())
        .filter(|d| seen.insert(d.name().to_string()))
        .collect();
    info!("Found {} Dataset object(s)", datasets.len());

    for dataset in datasets {
        let path = dataset.path(data_path);
        if dataset.already_exists(&path) {
            info!("{} already exists", dataset.name());
            continue;
        }
        info!("Creating dataset for {} at {}", dataset.name(), path.display());
        dataset.create(&path).map_err(|source| PerfError::DatasetCreation {
            dataset: dataset.name().to_string(),
            source,
        })?;
    }
    Ok(())
}

pub type WorkloadFactory = fn() -> Box<dyn Workload>;

/// Name -> constructor table, filled by explicit `register` calls.
#[derive(Default, Clone)]
pub struct WorkloadRegistry {
    factories: BTreeMap<String, WorkloadFactory>,
}

impl fmt::Debug for WorkloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkloadRegistry")
            .field("workloads", &self.names())
            .finish()
    }
}

impl WorkloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, factory: WorkloadFactory) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(PerfError::Config(format!("workload `{name}` registered twice")));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build the selected workloads, or all of them when `selected` is `None`.
    pub fn instantiate(&self, selected: Option<&[String]>) -> Result<Vec<Box<dyn Workload>>> {
        match selected {
            None => Ok(self.factories.values().map(|f| f()).collect()),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.factories.get(name).map(|f| f()).ok_or_else(|| {
                        PerfError::Config(format!(
                            "unknown workload `{name}`; registered workloads: {}",
                            self.names().join(", ")
                        ))
                    })
                })
                .collect(),
        }
    }
}
