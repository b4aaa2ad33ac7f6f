// crates/core/src/cache.rs
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::{PerfError, Result};

/// Evicts a dataset from the OS page cache before a run.
pub trait CacheFlusher {
    fn flush(&self, path: &Path) -> Result<()>;
}

/// Flushes with `vmtouch -e <path>`.
#[derive(Debug, Clone)]
pub struct VmtouchFlusher {
    program: PathBuf,
}

impl Default for VmtouchFlusher {
    fn default() -> Self {
        Self { program: PathBuf::from("vmtouch") }
    }
}

impl VmtouchFlusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific vmtouch binary instead of searching `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// Fails when the vmtouch binary cannot be launched. Call it before any
    /// expensive setup so a missing binary is reported up front.
    pub fn check_available(&self) -> Result<()> {
        // `vmtouch -h` exits non-zero after printing usage; only spawning matters.
        Command::new(&self.program)
            .arg("-h")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| self.launch_error(&self.program, e))?;
        debug!(program = %self.program.display(), "vmtouch available");
        Ok(())
    }

    fn launch_error(&self, path: &Path, err: std::io::Error) -> PerfError {
        PerfError::CacheFlush {
            path: path.to_path_buf(),
            reason: if err.kind() == ErrorKind::NotFound {
                format!(
                    "{} not found; install vmtouch to flush the page cache before each run, or use --keep-cache",
                    self.program.display()
                )
            } else {
                err.to_string()
            },
        }
    }
}

impl CacheFlusher for VmtouchFlusher {
    fn flush(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "evicting from page cache");
        let output = Command::new(&self.program)
            .arg("-e")
            .arg(path)
            .output()
            .map_err(|e| self.launch_error(path, e))?;
        if !output.status.success() {
            return Err(PerfError::CacheFlush {
                path: path.to_path_buf(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_explains_keep_cache() {
        let flusher = VmtouchFlusher::with_program("/nonexistent/vmtouch");
        let err = flusher.flush(Path::new("/tmp")).unwrap_err();
        assert!(err.to_string().contains("--keep-cache"), "{err}");
    }

    #[test]
    fn availability_check_spots_missing_binary() {
        let err = VmtouchFlusher::with_program("/nonexistent/vmtouch").check_available().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vmtouch not found"), "{err}");
        // Exit status is irrelevant; the binary launched.
        VmtouchFlusher::with_program("false").check_available().unwrap();
    }

    #[test]
    fn failing_command_reports_status() {
        let flusher = VmtouchFlusher::with_program("false");
        let err = flusher.flush(Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, PerfError::CacheFlush { .. }));
        assert!(err.to_string().contains("exited with"), "{err}");
    }
}
