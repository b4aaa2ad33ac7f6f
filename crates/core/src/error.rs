// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the counter engine and its collaborators.
#[derive(Debug, Error)]
pub enum PerfError {
    /// `start_timing_run` was called while a run was already being timed.
    #[error("start_timing_run called twice without stop_timing_run (run {run_id} still open)")]
    RunAlreadyStarted { run_id: u64 },

    /// `stop_timing_run` was called with no run in progress.
    #[error("stop_timing_run called without a preceding start_timing_run")]
    NoRunInProgress,

    /// A counter was stopped with metrics the manager never stamped.
    #[error("RunMetrics passed to counter `{counter}` has no {field}; only the CounterManager may stop counters")]
    UnstampedMetrics {
        counter: &'static str,
        field: &'static str,
    },

    /// Counters in one manager hold different run ids.
    #[error("counter `{counter}` is out of sync: expected run ids {expected:?}, found {found:?}")]
    CounterDesync {
        counter: String,
        expected: Vec<u64>,
        found: Vec<u64>,
    },

    /// Two counters in one manager report the same column.
    #[error("counter `{counter}` reports column `{column}`, which another counter already reports")]
    DuplicateColumn { counter: String, column: String },

    /// A counter received a run id that is not strictly greater than its last one.
    #[error("counter `{counter}` received run id {run_id} after run id {last}")]
    RunIdNotIncreasing {
        counter: String,
        run_id: u64,
        last: u64,
    },

    /// The DiskIO counter was used before a device was assigned.
    #[error("DiskIO counter has no device; resolve the dataset path before the first run")]
    DeviceNotSet,

    #[error("cannot resolve a block device for an empty path")]
    EmptyPath,

    #[error("no mount point found above {0:?}; use an absolute path")]
    NoMountPoint(PathBuf),

    #[error("no mounted partition matches mount point {mount_point:?} (resolved from {path:?})")]
    PartitionNotFound { path: PathBuf, mount_point: PathBuf },

    #[error("no I/O counters reported for device `{0}`")]
    DeviceCountersNotFound(String),

    #[error("failed to read OS counters: {0}")]
    System(String),

    #[error("cache flush failed for {path:?}: {reason}")]
    CacheFlush { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("workload `{workload}` failed on dataset `{dataset}`: {source}")]
    Workload {
        workload: String,
        dataset: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to create dataset `{dataset}`: {source}")]
    DatasetCreation {
        dataset: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<procfs::ProcError> for PerfError {
    fn from(err: procfs::ProcError) -> Self {
        PerfError::System(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PerfError>;
