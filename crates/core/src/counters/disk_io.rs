// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/counters/disk_io.rs
use std::sync::Arc;

use tracing::debug;

use super::Counter;
use crate::metrics::RunMetrics;
use crate::stats::safe_div;
use crate::system::{DiskIoSnapshot, SystemSource};
use crate::table::RunTable;
use crate::{PerfError, Result};

const BYTES_PER_GB: f64 = 1e9;
const MS_PER_SEC: f64 = 1e3;

/// Stored columns, in row order. Raw byte counts are not kept; only GB.
pub const DISK_IO_COLUMNS: [&str; 15] = [
    "read_count",
    "write_count",
    "read_merged_count",
    "write_merged_count",
    "read_time_secs",
    "write_time_secs",
    "busy_time_secs",
    "read GB",
    "write GB",
    "read GB / read_time_secs",
    "write GB / write_time_secs",
    "read_IOPS",
    "write_IOPS",
    "avg read GB/sec",
    "avg write GB/sec",
];

/// Device-scoped disk I/O over each run.
///
/// The counters come from one block device, but every process on the machine
/// contributes to them. Anything else touching that disk during a run shows
/// up in the results.
pub struct DiskIo {
    system: Arc<dyn SystemSource>,
    device: Option<String>,
    at_start: Option<DiskIoSnapshot>,
    data: RunTable,
}

impl std::fmt::Debug for DiskIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskIo")
            .field("device", &self.device)
            .field("runs", &self.data.len())
            .finish()
    }
}

impl DiskIo {
    pub fn new(system: Arc<dyn SystemSource>) -> Self {
        Self {
            system,
            device: None,
            at_start: None,
            data: RunTable::new(DISK_IO_COLUMNS),
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.set_device(device);
        self
    }

    /// Set the block device to observe. Must happen before the first run.
    pub fn set_device(&mut self, device: impl Into<String>) {
        self.device = Some(device.into());
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    fn snapshot(&self) -> Result<DiskIoSnapshot> {
        let device = self.device.as_deref().ok_or(PerfError::DeviceNotSet)?;
        self.system.disk_io_counters(device)
    }

    /// Turn a counter delta over `elapsed_seconds` into one stored row.
    pub fn derive_row(diff: &DiskIoSnapshot, elapsed_seconds: f64) -> Vec<f64> {
        let read_gb = diff.read_bytes as f64 / BYTES_PER_GB;
        let write_gb = diff.write_bytes as f64 / BYTES_PER_GB;
        let read_time_secs = diff.read_time_ms as f64 / MS_PER_SEC;
        let write_time_secs = diff.write_time_ms as f64 / MS_PER_SEC;
        let busy_time_secs = diff.busy_time_ms as f64 / MS_PER_SEC;

        vec![
            diff.read_count as f64,
            diff.write_count as f64,
            diff.read_merged_count as f64,
            diff.write_merged_count as f64,
            read_time_secs,
            write_time_secs,
            busy_time_secs,
            read_gb,
            write_gb,
            safe_div(read_gb, read_time_secs),
            safe_div(write_gb, write_time_secs),
            safe_div(diff.read_count as f64, elapsed_seconds),
            safe_div(diff.write_count as f64, elapsed_seconds),
            safe_div(read_gb, elapsed_seconds),
            safe_div(write_gb, elapsed_seconds),
        ]
    }
}

impl Counter for DiskIo {
    fn name(&self) -> &'static str {
        "Disk IO"
    }

    fn start_timing_run(&mut self) -> Result<()> {
        self.at_start = Some(self.snapshot()?);
        Ok(())
    }

    fn stop_timing_run(&mut self, metrics: &RunMetrics) -> Result<()> {
        let name = self.name();
        let elapsed = metrics.stamped_elapsed(name)?;
        let run_id = metrics.stamped_run_id(name)?;
        let at_start = self.at_start.take().ok_or(PerfError::NoRunInProgress)?;
        let at_end = self.snapshot()?;
        let diff = at_end.delta(&at_start);
        debug!(run_id, device = ?self.device, ?diff, "disk io delta");
        self.data.push(name, run_id, Self::derive_row(&diff, elapsed))
    }

    fn results(&self) -> &RunTable {
        &self.data
    }
}
