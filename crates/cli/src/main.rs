// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use perfcapture_core::{
    create_datasets_if_necessary, BenchConfig, BenchReport, OutputConfig, OutputFormat, ProcfsSystem,
    TrialRunner, VmtouchFlusher,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// perfcapture – capture the performance of this machine while running benchmark workloads
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run workload(s) and measure performance.
    ///
    /// Datasets missing from the data path are created first; creation time is
    /// not recorded. Existing datasets are reused and never removed, so delete
    /// them by hand after changing how a dataset is built.
    Bench {
        /// Directory holding the datasets the workloads read from
        #[arg(long)]
        data_path: Option<PathBuf>,

        /// YAML file with default settings; flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Space-separated workload names to run (default: all registered)
        #[arg(long)]
        workloads: Option<String>,

        /// Do not call `vmtouch -e` on the dataset before each run
        #[arg(long)]
        keep_cache: bool,

        /// Override the number of runs of every workload
        #[arg(long)]
        n_runs: Option<usize>,

        /// Directory to write the results table to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Results file format (csv, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// List registered workloads
    List,
}

/// Values given on the command line; each one wins over the config file.
#[derive(Debug, Default)]
struct Overrides {
    data_path: Option<PathBuf>,
    workloads: Option<String>,
    keep_cache: bool,
    n_runs: Option<usize>,
    output: Option<PathBuf>,
    format: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("perfcapture={log_level},perfcapture_core={log_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("perfcapture v{} starting", env!("CARGO_PKG_VERSION"));

    match args.command {
        Commands::Bench {
            data_path,
            config,
            workloads,
            keep_cache,
            n_runs,
            output,
            format,
        } => {
            let mut settings = match &config {
                Some(path) => BenchConfig::from_yaml_file(path)
                    .with_context(|| format!("Failed to load config {:?}", path))?,
                None => BenchConfig::default(),
            };
            let overrides = Overrides { data_path, workloads, keep_cache, n_runs, output, format };
            apply_overrides(&mut settings, overrides)?;
            run_bench(&settings)
        }
        Commands::List => list_workloads(),
    }
}

fn apply_overrides(settings: &mut BenchConfig, overrides: Overrides) -> Result<()> {
    if overrides.data_path.is_some() {
        settings.data_path = overrides.data_path;
    }
    if let Some(names) = overrides.workloads {
        settings.recipe = Some(names.split_whitespace().map(str::to_string).collect());
    }
    if overrides.keep_cache {
        settings.keep_cache = Some(true);
    }
    if overrides.n_runs.is_some() {
        settings.n_runs = overrides.n_runs;
    }

    let format: Option<OutputFormat> = overrides.format.as_deref().map(str::parse).transpose()?;
    if let Some(dir) = overrides.output {
        match settings.output.as_mut() {
            Some(out) => out.dir = dir,
            None => settings.output = Some(OutputConfig { dir, format: OutputFormat::default() }),
        }
    }
    if let Some(format) = format {
        let Some(out) = settings.output.as_mut() else {
            bail!("--format needs an output directory; pass --output or set output.dir in the config");
        };
        out.format = format;
    }

    settings.validate()?;
    Ok(())
}

fn run_bench(settings: &BenchConfig) -> Result<()> {
    let Some(data_path) = settings.data_path.as_deref() else {
        bail!("ERROR! No data path given; pass --data-path or set data_path in the config");
    };
    if !data_path.exists() {
        bail!("ERROR! {} does not exist! Please create the directory!", data_path.display());
    }
    // Device resolution walks up from the dataset, so it needs an absolute path.
    let data_path = data_path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {:?}", data_path))?;

    let registry = perfcapture_workloads::builtin_registry()?;
    let workloads = registry.instantiate(settings.recipe.as_deref())?;
    println!("Found {} Workload(s)", workloads.len());

    let flusher = if settings.keep_cache() {
        None
    } else {
        let flusher = VmtouchFlusher::new();
        flusher.check_available().context("ERROR! vmtouch is required to flush the page cache")?;
        Some(flusher)
    };

    create_datasets_if_necessary(&workloads, &data_path).context("Dataset creation failed")?;

    let mut runner = TrialRunner::new(Arc::new(ProcfsSystem::new())).with_n_runs(settings.n_runs);
    if let Some(flusher) = flusher {
        runner = runner.with_flusher(Box::new(flusher));
    }

    let report = runner.run_all(&workloads, &data_path).context("Benchmark failed")?;
    for pair in &report.pairs {
        println!(
            "{} on {} ({} runs):\n{}",
            pair.workload,
            pair.dataset,
            pair.runs.len(),
            pair.summary
        );
    }

    if let Some(out) = &settings.output {
        let path = write_report(&report, &out.dir, out.format)?;
        println!("Results written to {}", path.display());
    }
    Ok(())
}

fn write_report(report: &BenchReport, dir: &Path, format: OutputFormat) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {:?}", dir))?;
    let file_name = format!(
        "perfcapture_{}.{}",
        report.started_at.format("%Y%m%dT%H%M%SZ"),
        format.extension()
    );
    let path = dir.join(file_name);
    let content = match format {
        OutputFormat::Csv => report.table().to_csv(),
        OutputFormat::Json => report.to_json()?,
    };
    std::fs::write(&path, content).with_context(|| format!("Failed to write results to {:?}", path))?;
    Ok(path)
}

fn list_workloads() -> Result<()> {
    let registry = perfcapture_workloads::builtin_registry()?;
    for name in registry.names() {
        println!("{}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut settings =
            BenchConfig::from_yaml("data_path: /a\nn_runs: 3\noutput: {dir: out, format: json}").unwrap();
        let overrides = Overrides {
            data_path: Some(PathBuf::from("/b")),
            workloads: Some("ReadRawFile  ReadNumpyFile".to_string()),
            keep_cache: true,
            format: Some("csv".to_string()),
            ..Default::default()
        };
        apply_overrides(&mut settings, overrides).unwrap();
        assert_eq!(settings.data_path.as_deref(), Some(Path::new("/b")));
        assert_eq!(settings.recipe.as_ref().unwrap().len(), 2);
        assert!(settings.keep_cache());
        assert_eq!(settings.n_runs, Some(3));
        let out = settings.output.unwrap();
        assert_eq!(out.dir, PathBuf::from("out"));
        assert_eq!(out.format, OutputFormat::Csv);
    }

    #[test]
    fn output_dir_flag_creates_output_section() {
        let mut settings = BenchConfig::default();
        let overrides = Overrides {
            output: Some(PathBuf::from("results")),
            format: Some("json".to_string()),
            ..Default::default()
        };
        apply_overrides(&mut settings, overrides).unwrap();
        assert_eq!(settings.output.unwrap().format, OutputFormat::Json);
    }

    #[test]
    fn format_without_output_rejected() {
        let mut settings = BenchConfig::default();
        let overrides = Overrides { format: Some("json".to_string()), ..Default::default() };
        let err = apply_overrides(&mut settings, overrides).unwrap_err();
        assert!(err.to_string().contains("--output"), "{err}");
    }

    #[test]
    fn format_applies_to_config_output() {
        let mut settings = BenchConfig::from_yaml("output: {dir: out}").unwrap();
        let overrides = Overrides { format: Some("json".to_string()), ..Default::default() };
        apply_overrides(&mut settings, overrides).unwrap();
        assert_eq!(settings.output.unwrap().format, OutputFormat::Json);
    }

    #[test]
    fn zero_runs_rejected() {
        let mut settings = BenchConfig::default();
        let overrides = Overrides { n_runs: Some(0), ..Default::default() };
        assert!(apply_overrides(&mut settings, overrides).is_err());
    }
}
