// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `jobphase`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobphase",
    version,
    about = "Run phased, dependency-ordered batch jobs on Kubernetes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job model / config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBPHASE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the phases, but don't contact the cluster.
    #[arg(long, conflicts_with = "status")]
    pub dry_run: bool,

    /// Print the jobs of this run currently known to the cluster and exit.
    #[arg(long)]
    pub status: bool,

    /// With `--status`, only list jobs of this phase.
    #[arg(long, value_name = "INDEX", requires = "status", conflicts_with = "job")]
    pub phase: Option<usize>,

    /// With `--status`, only list instances of this job.
    #[arg(long, value_name = "NAME", requires = "status")]
    pub job: Option<String>,

    /// Override `[config].namespace`.
    #[arg(long, value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Override `[config].parallelization` (0 = unbounded).
    #[arg(long, value_name = "N")]
    pub parallelization: Option<usize>,

    /// Keep the jobs around after a successful run.
    #[arg(long)]
    pub no_cleanup: bool,

    /// Use the local kubeconfig instead of in-cluster credentials.
    #[arg(long)]
    pub kubeconfig: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
