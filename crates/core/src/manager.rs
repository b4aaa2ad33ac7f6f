// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/manager.rs
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::clock::{RunClock, Stopwatch};
use crate::counters::{Counter, DiskIo, PerfCounter, Runtime, Throughput};
use crate::device::DeviceResolver;
use crate::metrics::RunMetrics;
use crate::system::SystemSource;
use crate::table::{RunTable, Summary};
use crate::{PerfError, Result};

enum State {
    Idle,
    TimingRun(Box<dyn Stopwatch>),
}

type ClockFactory = Box<dyn FnMut() -> Box<dyn Stopwatch>>;

/// Drives a fixed set of counters through start/stop cycles.
///
/// Build one per (workload, dataset) pair. `start_timing_run` and
/// `stop_timing_run` must strictly alternate; anything else is an error.
pub struct CounterManager {
    counters: Vec<PerfCounter>,
    run_id: u64,
    state: State,
    clock: ClockFactory,
}

impl std::fmt::Debug for CounterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterManager")
            .field("counters", &self.counters)
            .field("run_id", &self.run_id)
            .field("timing", &self.is_timing())
            .finish()
    }
}

impl CounterManager {
    pub fn new(counters: Vec<PerfCounter>) -> Self {
        Self {
            counters,
            run_id: 0,
            state: State::Idle,
            clock: Box::new(|| Box::new(RunClock::start()) as Box<dyn Stopwatch>),
        }
    }

    /// Replace the wall clock armed at each `start_timing_run`.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: FnMut() -> Box<dyn Stopwatch> + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Runtime, throughput and disk I/O of the device backing `dataset_path`.
    pub fn for_dataset(dataset_path: &Path, system: Arc<dyn SystemSource>) -> Result<Self> {
        let device = DeviceResolver::new(system.as_ref()).resolve(dataset_path)?;
        Ok(Self::new(vec![
            Runtime::new().into(),
            Throughput::new().into(),
            DiskIo::new(system).with_device(device).into(),
        ]))
    }

    pub fn counters(&self) -> &[PerfCounter] {
        &self.counters
    }

    /// Id of the most recently started run; 0 before the first.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn is_timing(&self) -> bool {
        matches!(self.state, State::TimingRun(_))
    }

    pub fn start_timing_run(&mut self) -> Result<()> {
        if self.is_timing() {
            return Err(PerfError::RunAlreadyStarted { run_id: self.run_id });
        }
        if self.run_id == 0 {
            // Reject clashing columns before any run is spent.
            self.results()?;
        }
        self.run_id += 1;
        debug!(run_id = self.run_id, "starting run");
        for counter in self.counters.iter_mut() {
            counter.start_timing_run()?;
        }
        self.state = State::TimingRun((self.clock)());
        Ok(())
    }

    /// Stamp `metrics` with the elapsed time and run id, then stop every
    /// counter. A failing counter aborts the remaining updates of this run.
    pub fn stop_timing_run(&mut self, metrics: &mut RunMetrics) -> Result<()> {
        let clock = match std::mem::replace(&mut self.state, State::Idle) {
            State::TimingRun(clock) => clock,
            State::Idle => return Err(PerfError::NoRunInProgress),
        };
        // Computed once so every counter agrees on the run's duration.
        metrics.elapsed_seconds = Some(clock.elapsed_seconds());
        metrics.run_id = Some(self.run_id);
        debug!(run_id = self.run_id, elapsed_seconds = ?metrics.elapsed_seconds, "stopping run");
        for counter in self.counters.iter_mut() {
            counter.stop_timing_run(metrics)?;
        }
        Ok(())
    }

    /// All counters joined column-wise, one row per completed run.
    pub fn results(&self) -> Result<RunTable> {
        RunTable::join(self.counters.iter().map(|c| (c.name(), c.results())))
    }

    pub fn summary(&self) -> Result<Summary> {
        Ok(self.results()?.summary())
    }
}
