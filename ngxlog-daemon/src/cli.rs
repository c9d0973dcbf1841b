//! CLI argument definitions for ngxlog.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use ngxlog_core::config::ExporterConfig;

/// nginx access log histogram exporter.
///
/// Tails the configured access logs, classifies request paths and exposes
/// per-application Prometheus histograms.
#[derive(Parser, Debug)]
#[command(name = "ngxlog")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to the ngxlog.yaml configuration file.
    #[arg(short = 'c', long, default_value = "ngxlog.yaml")]
    pub config_file: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Load the configuration, compile every application and check every
    /// log file, then exit without starting the exporter.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut ExporterConfig) {
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.log_format.clone_from(format);
        }
    }
}
