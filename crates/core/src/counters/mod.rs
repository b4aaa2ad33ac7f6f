// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/counters/mod.rs
//
// A counter collects one or more values per timed run. The set of counters is
// closed (`PerfCounter`); the manager drives them through the `Counter` trait.
use crate::metrics::RunMetrics;
use crate::table::RunTable;
use crate::Result;

pub mod disk_io;
pub mod runtime;
pub mod throughput;

pub use disk_io::DiskIo;
pub use runtime::Runtime;
pub use throughput::Throughput;

/// Lifecycle shared by every performance counter.
///
/// 1. Construct when benchmarking starts for one (workload, dataset) pair.
/// 2. `start_timing_run` at the start of each run.
/// 3. `stop_timing_run` at the end of each run, with manager-stamped metrics.
/// 4. `results` at any time for the completed runs.
pub trait Counter {
    fn name(&self) -> &'static str;

    /// Take a "before" snapshot. Counters that derive everything from
    /// [`RunMetrics`] need nothing here.
    fn start_timing_run(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop_timing_run(&mut self, metrics: &RunMetrics) -> Result<()>;

    fn results(&self) -> &RunTable;
}

#[derive(Debug)]
pub enum PerfCounter {
    Runtime(Runtime),
    Throughput(Throughput),
    DiskIo(DiskIo),
}

impl PerfCounter {
    fn inner(&self) -> &dyn Counter {
        match self {
            PerfCounter::Runtime(c) => c,
            PerfCounter::Throughput(c) => c,
            PerfCounter::DiskIo(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Counter {
        match self {
            PerfCounter::Runtime(c) => c,
            PerfCounter::Throughput(c) => c,
            PerfCounter::DiskIo(c) => c,
        }
    }
}

impl Counter for PerfCounter {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn start_timing_run(&mut self) -> Result<()> {
        self.inner_mut().start_timing_run()
    }

    fn stop_timing_run(&mut self, metrics: &RunMetrics) -> Result<()> {
        self.inner_mut().stop_timing_run(metrics)
    }

    fn results(&self) -> &RunTable {
        self.inner().results()
    }
}

impl From<Runtime> for PerfCounter {
    fn from(c: Runtime) -> Self {
        PerfCounter::Runtime(c)
    }
}

impl From<Throughput> for PerfCounter {
    fn from(c: Throughput) -> Self {
        PerfCounter::Throughput(c)
    }
}

impl From<DiskIo> for PerfCounter {
    fn from(c: DiskIo) -> Self {
        PerfCounter::DiskIo(c)
    }
}
