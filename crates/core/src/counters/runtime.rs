use super::Counter;
use crate::metrics::RunMetrics;
use crate::table::RunTable;
use crate::Result;

pub const RUNTIME_COLUMN: &str = "Runtime in secs";

/// Wall-clock seconds per run, taken from the manager's clock.
#[derive(Debug, Clone)]
pub struct Runtime {
    data: RunTable,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self { data: RunTable::new([RUNTIME_COLUMN]) }
    }
}

impl Counter for Runtime {
    fn name(&self) -> &'static str {
        "Runtime"
    }

    fn stop_timing_run(&mut self, metrics: &RunMetrics) -> Result<()> {
        let name = self.name();
        let elapsed = metrics.stamped_elapsed(name)?;
        let run_id = metrics.stamped_run_id(name)?;
        self.data.push(name, run_id, vec![elapsed])
    }

    fn results(&self) -> &RunTable {
        &self.data
    }
}
