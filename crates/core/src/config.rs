// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/config.rs
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{PerfError, Result};

/// Benchmark session settings, usually loaded from YAML. CLI flags override them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct BenchConfig {
    /// Where datasets are created and read from.
    pub data_path: Option<PathBuf>,
    /// Workload names to run; all registered workloads when absent.
    #[serde(alias = "workloads", alias = "selected_workloads")]
    pub recipe: Option<Vec<String>>,
    /// Skip the page-cache flush before each run.
    pub keep_cache: Option<bool>,
    /// Override every workload's own run count.
    pub n_runs: Option<usize>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = PerfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(PerfError::Config(format!("unsupported output format `{other}`; use csv or json"))),
        }
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl BenchConfig {
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let config: BenchConfig = serde_yaml::from_str(yaml_str)
            .map_err(|e| PerfError::Config(format!("failed to parse YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path).map_err(|e| {
            PerfError::Config(format!("failed to read config file {:?}: {e}", path.as_ref()))
        })?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_runs == Some(0) {
            return Err(PerfError::Config("n_runs must be at least 1".to_string()));
        }
        if let Some(recipe) = &self.recipe {
            if recipe.iter().any(|name| name.trim().is_empty()) {
                return Err(PerfError::Config("recipe contains an empty workload name".to_string()));
            }
        }
        Ok(())
    }

    pub fn keep_cache(&self) -> bool {
        self.keep_cache.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
data_path: /data/bench
recipe: [ReadNumpyFile]
keep_cache: true
n_runs: 5
output:
  dir: results
  format: json
"#;
        let cfg = BenchConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.data_path.as_deref(), Some(Path::new("/data/bench")));
        assert_eq!(cfg.recipe, Some(vec!["ReadNumpyFile".to_string()]));
        assert!(cfg.keep_cache());
        assert_eq!(cfg.n_runs, Some(5));
        assert_eq!(cfg.output.unwrap().format, OutputFormat::Json);
    }

    #[test]
    fn defaults_when_empty() {
        let cfg = BenchConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg, BenchConfig::default());
        assert!(!cfg.keep_cache());
    }

    #[test]
    fn workloads_alias() {
        let cfg = BenchConfig::from_yaml("workloads: [A, B]").unwrap();
        assert_eq!(cfg.recipe.unwrap().len(), 2);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(BenchConfig::from_yaml("n_runs: 0").is_err());
        assert!(BenchConfig::from_yaml("recipe: ['']").is_err());
        assert!(BenchConfig::from_yaml("nonsense: 1").is_err());
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
    }
}
