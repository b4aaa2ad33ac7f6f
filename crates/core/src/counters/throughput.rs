use super::Counter;
use crate::metrics::RunMetrics;
use crate::stats::safe_div;
use crate::table::RunTable;
use crate::Result;

pub const THROUGHPUT_COLUMN: &str = "GB/sec to numpy";

const BYTES_PER_GB: f64 = 1e9;

/// Bandwidth from storage into the workload's final in-memory array, in GB/s.
///
/// A run with zero elapsed time reports 0 GB/s.
#[derive(Debug, Clone)]
pub struct Throughput {
    data: RunTable,
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new()
    }
}

impl Throughput {
    pub fn new() -> Self {
        Self { data: RunTable::new([THROUGHPUT_COLUMN]) }
    }

    pub fn gigabytes_per_sec(produced_byte_count: u64, elapsed_seconds: f64) -> f64 {
        safe_div(produced_byte_count as f64, elapsed_seconds) / BYTES_PER_GB
    }
}

impl Counter for Throughput {
    fn name(&self) -> &'static str {
        "BandwidthToNumpy"
    }

    fn stop_timing_run(&mut self, metrics: &RunMetrics) -> Result<()> {
        let name = self.name();
        let elapsed = metrics.stamped_elapsed(name)?;
        let run_id = metrics.stamped_run_id(name)?;
        let gbps = Self::gigabytes_per_sec(metrics.produced_byte_count, elapsed);
        self.data.push(name, run_id, vec![gbps])
    }

    fn results(&self) -> &RunTable {
        &self.data
    }
}
