// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/device.rs
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::system::SystemSource;
use crate::{PerfError, Result};

/// Maps a filesystem path to the block device that backs it.
#[derive(Clone, Copy)]
pub struct DeviceResolver<'a> {
    system: &'a dyn SystemSource,
}

impl<'a> DeviceResolver<'a> {
    pub fn new(system: &'a dyn SystemSource) -> Self {
        Self { system }
    }

    /// Nearest ancestor of `path` (inclusive) that is a mount point.
    pub fn mount_point(&self, path: &Path) -> Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(PerfError::EmptyPath);
        }
        path.ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .find(|p| self.system.is_mount_point(p))
            .map(Path::to_path_buf)
            .ok_or_else(|| PerfError::NoMountPoint(path.to_path_buf()))
    }

    /// Device name (e.g. `nvme0n1p2`) of the partition mounted at the nearest
    /// mount point above `path`.
    pub fn resolve(&self, path: &Path) -> Result<String> {
        let mount_point = self.mount_point(path)?;
        let partition = self
            .system
            .partitions()?
            .into_iter()
            .find(|p| p.mount_point == mount_point)
            .ok_or_else(|| PerfError::PartitionNotFound {
                path: path.to_path_buf(),
                mount_point: mount_point.clone(),
            })?;

        // /dev/disk/by-uuid/... and /dev/mapper/... are usually symlinks.
        let node = match std::fs::canonicalize(&partition.device) {
            Ok(node) => node,
            Err(e) => {
                warn!(
                    device = %partition.device.display(),
                    error = %e,
                    "could not canonicalize device node; using its name as listed"
                );
                partition.device
            }
        };
        let device = node
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| PerfError::PartitionNotFound {
                path: path.to_path_buf(),
                mount_point: mount_point.clone(),
            })?;

        info!(path = %path.display(), mount_point = %mount_point.display(), device = %device, "resolved dataset device");
        Ok(device)
    }
}
