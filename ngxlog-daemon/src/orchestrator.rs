//! Exporter orchestration -- compilation, verification and monitor lifecycle.
//!
//! The [`Orchestrator`] is the central coordinator of `ngxlog`.
//! It validates configuration, compiles every application profile, verifies
//! every log file, installs the metrics recorder and runs one tailer and
//! one monitor task per log file.
//!
//! # Startup Order (all-or-nothing)
//!
//! 1. Validate configuration
//! 2. Compile every application profile (format, rules, templates)
//! 3. Verify every log file is a readable regular file
//! 4. Install the Prometheus recorder
//! 5. Spawn tailer + monitor tasks
//!
//! Nothing is spawned until steps 1-4 succeed for every application.
//!
//! # Shutdown
//!
//! `SIGTERM` or `SIGINT` aborts all tasks. There is no state to flush.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use ngxlog_core::config::ExporterConfig;
use ngxlog_core::error::ExporterError;
use ngxlog_log_pipeline::{ApplicationProfile, FileMonitor, verify_log_file};

use crate::metrics_server;

/// The main exporter orchestrator.
///
/// Holds the validated configuration and the compiled, shared profiles.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: ExporterConfig,
    /// Compiled application profiles, in application name order.
    profiles: Vec<Arc<ApplicationProfile>>,
}

impl Orchestrator {
    /// Build from an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - Any application fails to compile
    /// - Any log file cannot be opened
    ///
    /// The underlying [`ExporterError`] stays reachable through
    /// `anyhow::Error::downcast_ref`.
    pub async fn build_from_config(config: ExporterConfig) -> Result<Self> {
        config
            .validate()
            .map_err(ExporterError::from)
            .context("config validation failed")?;

        let profiles = compile_profiles(&config)?;
        verify_log_files(&profiles).await?;

        if profiles.is_empty() {
            tracing::warn!("no applications configured; only the scrape endpoint will run");
        }

        tracing::info!(
            applications = profiles.len(),
            log_files = config.log_file_count(),
            "orchestrator initialized"
        );

        Ok(Self { config, profiles })
    }

    /// Install the recorder, start all monitors and wait for a shutdown signal.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(self) -> Result<()> {
        metrics_server::install_metrics_recorder(&self.config.listen, &self.profiles)?;

        let tasks = self.spawn_monitors();
        tracing::info!(tasks = tasks.len(), "exporter running");

        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal = signal, "shutdown signal received");

        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            let _ = task.await;
        }

        tracing::info!("ngxlog shut down");
        Ok(())
    }

    /// Spawn a tailer and a monitor task for every configured log file.
    pub fn spawn_monitors(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::with_capacity(self.config.log_file_count() * 2);
        for profile in &self.profiles {
            for path in &profile.log_files {
                tracing::info!(
                    application = %profile.name,
                    file = %path.display(),
                    "starting file monitor"
                );
                tasks.extend(FileMonitor::spawn(
                    Arc::clone(profile),
                    path.clone(),
                    &self.config.tail,
                ));
            }
        }
        tasks
    }

    /// Compiled application profiles.
    pub fn profiles(&self) -> &[Arc<ApplicationProfile>] {
        &self.profiles
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }
}

/// Compile every application in the configuration.
///
/// Stops at the first failure; the error names the application and field.
pub fn compile_profiles(config: &ExporterConfig) -> Result<Vec<Arc<ApplicationProfile>>> {
    config
        .applications
        .iter()
        .map(|(name, app)| {
            tracing::debug!(application = %name, "compiling application");
            ApplicationProfile::compile(name, app)
                .map(Arc::new)
                .map_err(ExporterError::from)
                .with_context(|| format!("failed to compile application '{name}'"))
        })
        .collect()
}

/// Check that every log file of every profile can be opened.
pub async fn verify_log_files(profiles: &[Arc<ApplicationProfile>]) -> Result<()> {
    for profile in profiles {
        for path in &profile.log_files {
            verify_log_file(path)
                .await
                .map_err(ExporterError::from)
                .with_context(|| format!("application '{}'", profile.name))?;
        }
    }
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl+C handler: {}", e))?;
    Ok("SIGINT")
}
