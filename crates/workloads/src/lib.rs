// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/workloads/src/lib.rs
//
pub mod numpy;
pub mod raw;

pub use numpy::{NumpyDataset, ReadNumpyFile};
pub use raw::{RawDataset, ReadRawFile};

use perfcapture_core::{Result, Workload, WorkloadRegistry};

/// Register every built-in workload.
pub fn register_all(registry: &mut WorkloadRegistry) -> Result<()> {
    registry.register(numpy::READ_NUMPY_FILE, || Box::new(ReadNumpyFile::default()) as Box<dyn Workload>)?;
    registry.register(raw::READ_RAW_FILE, || Box::new(ReadRawFile::default()) as Box<dyn Workload>)?;
    Ok(())
}

/// A registry holding the built-in workloads.
pub fn builtin_registry() -> Result<WorkloadRegistry> {
    let mut registry = WorkloadRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}
