//! Core library for perfcapture: counters, the counter manager and the trial runner.

pub mod cache;
pub mod clock;
pub mod config;
pub mod counters;
pub mod device;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod runner;
pub mod stats;
pub mod system;
pub mod table;
pub mod workload;

pub use cache::{CacheFlusher, VmtouchFlusher};
pub use clock::{RunClock, Stopwatch};
pub use config::{BenchConfig, OutputConfig, OutputFormat};
pub use counters::{Counter, DiskIo, PerfCounter, Runtime, Throughput};
pub use device::DeviceResolver;
pub use error::{PerfError, Result};
pub use manager::CounterManager;
pub use metrics::RunMetrics;
pub use runner::{BenchReport, PairReport, TrialRunner};
pub use system::{DiskIoSnapshot, Partition, ProcfsSystem, SystemSource};
pub use table::{ResultTable, RunKey, RunTable, Summary};
pub use workload::{create_datasets_if_necessary, path_not_empty, Dataset, Workload, WorkloadRegistry};
