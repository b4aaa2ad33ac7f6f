// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/system.rs
//
// OS counter sources. The resolver and the DiskIO counter only ever talk to a
// `SystemSource`, so tests can substitute `FakeSystem` for /proc.
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::{PerfError, Result};

const SECTOR_BYTES: u64 = 512;

/// One `(device, mountpoint)` pair as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub device: PathBuf,
    pub mount_point: PathBuf,
}

impl Partition {
    pub fn new(device: impl Into<PathBuf>, mount_point: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            mount_point: mount_point.into(),
        }
    }
}

/// Cumulative I/O counters of one block device, as in /proc/diskstats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskIoSnapshot {
    pub read_count: u64,
    pub write_count: u64,
    pub read_merged_count: u64,
    pub write_merged_count: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_time_ms: u64,
    pub write_time_ms: u64,
    pub busy_time_ms: u64,
}

impl DiskIoSnapshot {
    /// Field-wise `self - earlier`. A counter that went backwards (device
    /// reset, wrap) contributes 0.
    pub fn delta(&self, earlier: &DiskIoSnapshot) -> DiskIoSnapshot {
        DiskIoSnapshot {
            read_count: self.read_count.saturating_sub(earlier.read_count),
            write_count: self.write_count.saturating_sub(earlier.write_count),
            read_merged_count: self.read_merged_count.saturating_sub(earlier.read_merged_count),
            write_merged_count: self.write_merged_count.saturating_sub(earlier.write_merged_count),
            read_bytes: self.read_bytes.saturating_sub(earlier.read_bytes),
            write_bytes: self.write_bytes.saturating_sub(earlier.write_bytes),
            read_time_ms: self.read_time_ms.saturating_sub(earlier.read_time_ms),
            write_time_ms: self.write_time_ms.saturating_sub(earlier.write_time_ms),
            busy_time_ms: self.busy_time_ms.saturating_sub(earlier.busy_time_ms),
        }
    }
}

/// Read-only view of the machine state the counters depend on.
pub trait SystemSource: Send + Sync {
    /// Mounted partitions.
    fn partitions(&self) -> Result<Vec<Partition>>;

    /// Point-in-time counters for `device` (a name like `sda1`, not a path).
    fn disk_io_counters(&self, device: &str) -> Result<DiskIoSnapshot>;

    /// True when `path` is the root of a mounted filesystem.
    fn is_mount_point(&self, path: &Path) -> bool;
}

/// `SystemSource` backed by /proc via the `procfs` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcfsSystem;

impl ProcfsSystem {
    pub fn new() -> Self {
        Self
    }
}

impl SystemSource for ProcfsSystem {
    fn partitions(&self) -> Result<Vec<Partition>> {
        let mounts = procfs::mounts()?;
        Ok(mounts
            .into_iter()
            // Pseudo filesystems (proc, tmpfs, overlay, ...) have no device node.
            .filter(|m| m.fs_spec.starts_with('/'))
            .map(|m| Partition::new(m.fs_spec, m.fs_file))
            .collect())
    }

    fn disk_io_counters(&self, device: &str) -> Result<DiskIoSnapshot> {
        let stat = procfs::diskstats()?
            .into_iter()
            .find(|s| s.name == device)
            .ok_or_else(|| PerfError::DeviceCountersNotFound(device.to_string()))?;
        Ok(DiskIoSnapshot {
            read_count: stat.reads as u64,
            write_count: stat.writes as u64,
            read_merged_count: stat.merged as u64,
            write_merged_count: stat.writes_merged as u64,
            read_bytes: stat.sectors_read as u64 * SECTOR_BYTES,
            write_bytes: stat.sectors_written as u64 * SECTOR_BYTES,
            read_time_ms: stat.time_reading as u64,
            write_time_ms: stat.time_writing as u64,
            busy_time_ms: stat.time_in_progress as u64,
        })
    }

    fn is_mount_point(&self, path: &Path) -> bool {
        let (Ok(meta), Ok(parent)) = (fs::symlink_metadata(path), fs::symlink_metadata(path.join(".."))) else {
            return false;
        };
        if meta.file_type().is_symlink() {
            return false;
        }
        // A different device than the parent, or the parent is the directory itself ("/").
        let is_mount = meta.dev() != parent.dev() || meta.ino() == parent.ino();
        if is_mount {
            debug!(path = %path.display(), "found mount point");
        }
        is_mount
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod fake {
    //! In-memory `SystemSource` for deterministic tests.
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use super::{DiskIoSnapshot, Partition, SystemSource};
    use crate::{PerfError, Result};

    /// Scripted OS state. Each `disk_io_counters` call pops the next queued
    /// snapshot for the device; the last one stays put once the queue drains.
    #[derive(Debug, Default)]
    pub struct FakeSystem {
        partitions: Vec<Partition>,
        mount_points: HashSet<PathBuf>,
        snapshots: Mutex<HashMap<String, VecDeque<DiskIoSnapshot>>>,
    }

    impl FakeSystem {
        pub fn new() -> Self {
            let mut fake = Self::default();
            fake.mount_points.insert(PathBuf::from("/"));
            fake
        }

        /// Register a partition and mark its mount point.
        pub fn with_partition(mut self, device: &str, mount_point: &str) -> Self {
            self.mount_points.insert(PathBuf::from(mount_point));
            self.partitions.push(Partition::new(device, mount_point));
            self
        }

        /// Mark a mount point with no partition entry behind it.
        pub fn with_mount_point(mut self, mount_point: &str) -> Self {
            self.mount_points.insert(PathBuf::from(mount_point));
            self
        }

        pub fn with_snapshots(self, device: &str, snapshots: impl IntoIterator<Item = DiskIoSnapshot>) -> Self {
            self.queue_snapshots(device, snapshots);
            self
        }

        pub fn queue_snapshots(&self, device: &str, snapshots: impl IntoIterator<Item = DiskIoSnapshot>) {
            let mut guard = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
            guard.entry(device.to_string()).or_default().extend(snapshots);
        }
    }

    impl SystemSource for FakeSystem {
        fn partitions(&self) -> Result<Vec<Partition>> {
            Ok(self.partitions.clone())
        }

        fn disk_io_counters(&self, device: &str) -> Result<DiskIoSnapshot> {
            let mut guard = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
            let queue = guard
                .get_mut(device)
                .filter(|q| !q.is_empty())
                .ok_or_else(|| PerfError::DeviceCountersNotFound(device.to_string()))?;
            if queue.len() > 1 {
                Ok(queue.pop_front().unwrap_or_default())
            } else {
                Ok(queue[0])
            }
        }

        fn is_mount_point(&self, path: &Path) -> bool {
            self.mount_points.contains(path)
        }
    }
}
