// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/runner.rs
//
// Runs every (workload, dataset) pair `n_runs` times, strictly one trial after
// another. Assumes nothing else uses the dataset's disk meanwhile.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::cache::CacheFlusher;
use crate::manager::CounterManager;
use crate::system::SystemSource;
use crate::table::{ResultTable, RunTable, Summary};
use crate::workload::{Dataset, Workload};
use crate::{PerfError, Result};

/// Results for one (workload, dataset) pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub workload: String,
    pub dataset: String,
    pub dataset_path: PathBuf,
    pub runs: RunTable,
    pub summary: Summary,
}

/// Results of a whole benchmark session.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pairs: Vec<PairReport>,
}

impl BenchReport {
    /// One tidy table indexed by (workload, dataset, run_id).
    pub fn table(&self) -> ResultTable {
        let mut table = ResultTable::new();
        for pair in &self.pairs {
            table.append(ResultTable::from_runs(&pair.workload, &pair.dataset, &pair.runs));
        }
        table
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct TrialRunner {
    system: Arc<dyn SystemSource>,
    flusher: Option<Box<dyn CacheFlusher>>,
    n_runs_override: Option<usize>,
}

impl std::fmt::Debug for TrialRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialRunner")
            .field("flush_cache", &self.flusher.is_some())
            .field("n_runs_override", &self.n_runs_override)
            .finish()
    }
}

impl TrialRunner {
    /// A runner that keeps the page cache warm.
    pub fn new(system: Arc<dyn SystemSource>) -> Self {
        Self {
            system,
            flusher: None,
            n_runs_override: None,
        }
    }

    /// Flush the dataset from the page cache before every run.
    pub fn with_flusher(mut self, flusher: Box<dyn CacheFlusher>) -> Self {
        self.flusher = Some(flusher);
        self
    }

    pub fn with_n_runs(mut self, n_runs: Option<usize>) -> Self {
        self.n_runs_override = n_runs;
        self
    }

    /// Time `workload` on `dataset`. The manager is built once for the pair,
    /// which resolves the dataset's block device before the first run.
    pub fn run_pair(&self, workload: &dyn Workload, dataset: &dyn Dataset, data_path: &Path) -> Result<PairReport> {
        let path = dataset.path(data_path);
        let n_runs = self.n_runs_override.unwrap_or_else(|| workload.n_runs());
        info!("Running {} {} times on {}", workload.name(), n_runs, path.display());

        let mut manager = CounterManager::for_dataset(&path, Arc::clone(&self.system))?;
        for _ in 0..n_runs {
            // Flush outside the timed window so neither clock nor disk deltas see it.
            if let Some(flusher) = &self.flusher {
                flusher.flush(&path)?;
            }
            manager.start_timing_run()?;
            let mut metrics = workload.run(&path).map_err(|source| PerfError::Workload {
                workload: workload.name().to_string(),
                dataset: dataset.name().to_string(),
                source,
            })?;
            manager.stop_timing_run(&mut metrics)?;
        }

        let runs = manager.results()?;
        let summary = runs.summary();
        info!("Finished {} on {}:\n{}", workload.name(), dataset.name(), summary);
        Ok(PairReport {
            workload: workload.name().to_string(),
            dataset: dataset.name().to_string(),
            dataset_path: path,
            runs,
            summary,
        })
    }

    /// Every dataset of every workload, in order.
    pub fn run_all(&self, workloads: &[Box<dyn Workload>], data_path: &Path) -> Result<BenchReport> {
        let started_at = Utc::now();
        let mut pairs = Vec::new();
        for workload in workloads {
            for dataset in workload.datasets() {
                pairs.push(self.run_pair(workload.as_ref(), dataset.as_ref(), data_path)?);
            }
        }
        Ok(BenchReport {
            started_at,
            finished_at: Utc::now(),
            pairs,
        })
    }
}
