use serde::{Deserialize, Serialize};

/// Per-run fact sheet produced by a workload.
///
/// A workload only fills in `produced_byte_count`. `elapsed_seconds` and
/// `run_id` are stamped by the [`CounterManager`](crate::CounterManager) when
/// the run is stopped, so every counter of that run sees the same values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub produced_byte_count: u64,
    pub elapsed_seconds: Option<f64>,
    pub run_id: Option<u64>,
}

impl RunMetrics {
    pub fn new(produced_byte_count: u64) -> Self {
        Self {
            produced_byte_count,
            ..Self::default()
        }
    }

    /// Elapsed time stamped by the manager, or an error naming the counter
    /// that tried to read it too early.
    pub(crate) fn stamped_elapsed(&self, counter: &'static str) -> crate::Result<f64> {
        self.elapsed_seconds
            .ok_or(crate::PerfError::UnstampedMetrics { counter, field: "elapsed_seconds" })
    }

    pub(crate) fn stamped_run_id(&self, counter: &'static str) -> crate::Result<u64> {
        self.run_id
            .ok_or(crate::PerfError::UnstampedMetrics { counter, field: "run_id" })
    }
}
