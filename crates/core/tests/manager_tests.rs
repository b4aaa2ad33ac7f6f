use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use perfcapture_core::counters::disk_io::DISK_IO_COLUMNS;
use perfcapture_core::counters::runtime::RUNTIME_COLUMN;
use perfcapture_core::counters::throughput::THROUGHPUT_COLUMN;
use perfcapture_core::system::fake::FakeSystem;
use perfcapture_core::{
    CounterManager, DiskIo, DiskIoSnapshot, Partition, PerfError, RunMetrics, Runtime, Stopwatch,
    SystemSource, Throughput,
};
use proptest::prelude::*;

struct FixedClock(f64);

impl Stopwatch for FixedClock {
    fn elapsed_seconds(&self) -> f64 {
        self.0
    }
}

fn scripted_manager(elapsed: Vec<f64>) -> CounterManager {
    let mut times = elapsed.into_iter();
    CounterManager::new(vec![Runtime::new().into(), Throughput::new().into()])
        .with_clock(move || Box::new(FixedClock(times.next().unwrap_or(0.0))) as Box<dyn Stopwatch>)
}

#[test]
fn runtime_and_throughput_over_three_runs() {
    let mut manager = scripted_manager(vec![1.0, 2.0, 1.0]);
    for bytes in [1_000_000_000u64, 1_000_000_000, 2_000_000_000] {
        manager.start_timing_run().unwrap();
        let mut metrics = RunMetrics::new(bytes);
        manager.stop_timing_run(&mut metrics).unwrap();
    }

    let results = manager.results().unwrap();
    assert_eq!(results.run_ids(), [1, 2, 3]);
    assert_eq!(results.column(RUNTIME_COLUMN).unwrap(), vec![1.0, 2.0, 1.0]);
    assert_eq!(results.column(THROUGHPUT_COLUMN).unwrap(), vec![1.0, 0.5, 2.0]);

    let summary = manager.summary().unwrap();
    let runtime = summary.get(RUNTIME_COLUMN).unwrap();
    assert!((runtime.mean - 4.0 / 3.0).abs() < 1e-12);
}

#[test]
fn summary_of_known_series() {
    let mut manager = scripted_manager(vec![1.0, 2.0, 3.0]);
    for _ in 0..3 {
        manager.start_timing_run().unwrap();
        manager.stop_timing_run(&mut RunMetrics::new(0)).unwrap();
    }
    let summary = manager.summary().unwrap();
    let runtime = summary.get(RUNTIME_COLUMN).unwrap();
    assert_eq!(runtime.mean, 2.0);
    assert!((runtime.std - 1.0).abs() < 1e-12);
}

#[test]
fn zero_elapsed_run_does_not_abort() {
    let mut manager = scripted_manager(vec![0.0]);
    manager.start_timing_run().unwrap();
    manager.stop_timing_run(&mut RunMetrics::new(123)).unwrap();
    assert_eq!(manager.results().unwrap().value(1, THROUGHPUT_COLUMN), Some(0.0));
}

#[test]
fn stop_before_any_start_fails_without_run_id() {
    let mut manager = scripted_manager(vec![]);
    let mut metrics = RunMetrics::new(1);
    let err = manager.stop_timing_run(&mut metrics).unwrap_err();
    assert!(matches!(err, PerfError::NoRunInProgress));
    assert!(metrics.run_id.is_none());
    assert!(manager.results().unwrap().is_empty());
}

#[test]
fn disk_io_through_manager() {
    let before = DiskIoSnapshot { read_count: 10, read_bytes: 1_000, read_time_ms: 10, ..Default::default() };
    let after = DiskIoSnapshot { read_count: 30, read_bytes: 3_000, read_time_ms: 20, ..Default::default() };
    let system = Arc::new(
        FakeSystem::new()
            .with_partition("/dev/nvme0n1p1", "/data")
            .with_snapshots("nvme0n1p1", [before, after]),
    );
    let mut times = vec![2.0].into_iter();
    let mut manager = CounterManager::for_dataset("/data/numpy".as_ref(), system)
        .unwrap()
        .with_clock(move || Box::new(FixedClock(times.next().unwrap_or(0.0))) as Box<dyn Stopwatch>);

    manager.start_timing_run().unwrap();
    manager.stop_timing_run(&mut RunMetrics::new(0)).unwrap();

    let results = manager.results().unwrap();
    assert_eq!(results.columns().len(), 2 + DISK_IO_COLUMNS.len());
    assert_eq!(results.value(1, "read_IOPS"), Some(10.0));
    let gbps = results.value(1, "read GB / read_time_secs").unwrap();
    assert!((gbps - 2e-4).abs() < 1e-15);
}

#[test]
fn unresolvable_dataset_fails_at_construction() {
    let system = Arc::new(FakeSystem::new().with_mount_point("/mnt/nfs"));
    let err = CounterManager::for_dataset("/mnt/nfs/data".as_ref(), system).unwrap_err();
    assert!(matches!(err, PerfError::PartitionNotFound { .. }));
}

/// Counters succeed for the first `healthy_calls` reads, then the device vanishes.
struct FlakySystem {
    healthy_calls: usize,
    calls: AtomicUsize,
}

impl SystemSource for FlakySystem {
    fn partitions(&self) -> perfcapture_core::Result<Vec<Partition>> {
        Ok(Vec::new())
    }

    fn disk_io_counters(&self, device: &str) -> perfcapture_core::Result<DiskIoSnapshot> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.healthy_calls {
            Ok(DiskIoSnapshot::default())
        } else {
            Err(PerfError::DeviceCountersNotFound(device.to_string()))
        }
    }

    fn is_mount_point(&self, _path: &Path) -> bool {
        true
    }
}

fn flaky_manager(healthy_calls: usize) -> CounterManager {
    let system = Arc::new(FlakySystem { healthy_calls, calls: AtomicUsize::new(0) });
    CounterManager::new(vec![
        Runtime::new().into(),
        DiskIo::new(system).with_device("sdz").into(),
        Throughput::new().into(),
    ])
}

#[test]
fn failing_stop_aborts_remaining_counters() {
    let mut manager = flaky_manager(1);
    manager.start_timing_run().unwrap();
    let err = manager.stop_timing_run(&mut RunMetrics::new(0)).unwrap_err();
    assert!(matches!(err, PerfError::DeviceCountersNotFound(_)));
    assert!(!manager.is_timing());

    // Runtime recorded run 1, DiskIO and Throughput did not.
    match manager.results().unwrap_err() {
        PerfError::CounterDesync { counter, expected, found } => {
            assert_eq!(counter, "Disk IO");
            assert_eq!(expected, vec![1]);
            assert!(found.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_start_leaves_manager_idle() {
    let mut manager = flaky_manager(0);
    assert!(matches!(
        manager.start_timing_run(),
        Err(PerfError::DeviceCountersNotFound(_))
    ));
    assert!(!manager.is_timing());
    assert!(matches!(
        manager.stop_timing_run(&mut RunMetrics::new(0)),
        Err(PerfError::NoRunInProgress)
    ));
}

proptest! {
    #[test]
    fn run_ids_are_one_to_n(n in 0usize..40) {
        let mut manager = scripted_manager(vec![0.5; n]);
        let mut seen = Vec::new();
        for _ in 0..n {
            manager.start_timing_run().unwrap();
            let mut metrics = RunMetrics::new(1);
            manager.stop_timing_run(&mut metrics).unwrap();
            seen.push(metrics.run_id.unwrap());
        }
        let expected: Vec<u64> = (1..=n as u64).collect();
        let results = manager.results().unwrap();
        prop_assert_eq!(&seen, &expected);
        prop_assert_eq!(results.run_ids(), expected.as_slice());
    }
}
