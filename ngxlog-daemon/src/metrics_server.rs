//! Prometheus metrics HTTP server.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`
//! to expose the scrape endpoint.
//!
//! Histogram buckets are configured per metric family, so every access log
//! histogram uses the sorted union of all applications' buckets.
//!
//! # Usage
//!
//! ```ignore
//! install_metrics_recorder(&config.listen, &profiles)?;
//! // After this, all metrics::counter!() and metrics::histogram!() calls are recorded
//! ```

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Result;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

use ngxlog_core::config::ListenConfig;
use ngxlog_core::metrics as m;
use ngxlog_log_pipeline::ApplicationProfile;

/// Sorted, de-duplicated union of every application's histogram buckets.
///
/// Falls back to the Prometheus defaults when there are no applications.
pub fn bucket_union(profiles: &[Arc<ApplicationProfile>]) -> Vec<f64> {
    let mut buckets: Vec<f64> = profiles
        .iter()
        .flat_map(|p| p.histogram_buckets.iter().copied())
        .filter(|b| b.is_finite())
        .collect();
    if buckets.is_empty() {
        return m::DEFAULT_HISTOGRAM_BUCKETS.to_vec();
    }
    buckets.sort_by(f64::total_cmp);
    buckets.dedup();
    buckets
}

/// Resolve the scrape listener address.
///
/// # Errors
///
/// - Endpoint other than `/metrics`
/// - Address/port do not form a valid socket address
pub fn listen_addr(listen: &ListenConfig) -> Result<SocketAddr> {
    if listen.endpoint != "/metrics" {
        return Err(anyhow::anyhow!(
            "unsupported metrics endpoint '{}': only '/metrics' is currently supported",
            listen.endpoint
        ));
    }

    let ip: IpAddr = listen
        .address
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address '{}': {}", listen.address, e))?;
    Ok(SocketAddr::new(ip, listen.port))
}

/// Build the Prometheus recorder builder without installing it.
pub fn build_recorder(
    listen: &ListenConfig,
    profiles: &[Arc<ApplicationProfile>],
) -> Result<(PrometheusBuilder, SocketAddr)> {
    let addr = listen_addr(listen)?;
    let buckets = bucket_union(profiles);

    let mut builder = PrometheusBuilder::new().with_http_listener(addr);
    for name in m::HTTP_HISTOGRAMS {
        builder = builder
            .set_buckets_for_metric(Matcher::Full(name.to_owned()), &buckets)
            .map_err(|e| anyhow::anyhow!("invalid histogram buckets for {}: {}", name, e))?;
    }

    Ok((builder, addr))
}

/// Install the global metrics recorder and start the HTTP listener.
///
/// This function should be called once per process, after every profile
/// has been compiled.
///
/// # Errors
///
/// - Unsupported endpoint or invalid address
/// - Socket binding fails
/// - Global recorder is already installed
pub fn install_metrics_recorder(
    listen: &ListenConfig,
    profiles: &[Arc<ApplicationProfile>],
) -> Result<()> {
    let (builder, addr) = build_recorder(listen, profiles)?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces; restrict listen.address in untrusted networks"
        );
    }

    tracing::info!(listen_addr = %addr, "installing Prometheus metrics recorder");

    builder
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    // Register metric descriptions
    m::describe_all();

    tracing::info!(
        listen_addr = %addr,
        endpoint = %listen.endpoint,
        "Prometheus metrics endpoint active"
    );

    Ok(())
}
