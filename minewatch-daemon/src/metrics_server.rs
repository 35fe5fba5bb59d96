//! Prometheus scrape endpoint for the pipeline counters.
//!
//! The exporter's built-in HTTP listener serves `/metrics`. Labelled
//! counters are seeded at zero on install so dashboards see every event
//! kind and sink before the first player joins.

use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use minewatch_core::config::MetricsConfig;
use minewatch_core::event::{
    EVENT_TYPE_ADVANCEMENT, EVENT_TYPE_DEATH, EVENT_TYPE_LOGIN, EVENT_TYPE_LOGOUT,
};
use minewatch_core::metrics as m;

/// Event kinds seeded under `minewatch_log_pipeline_events_total`.
const EVENT_KINDS: [&str; 4] = [
    EVENT_TYPE_LOGIN,
    EVENT_TYPE_LOGOUT,
    EVENT_TYPE_ADVANCEMENT,
    EVENT_TYPE_DEATH,
];

/// Streak notice kinds seeded under `minewatch_log_pipeline_streak_notices_total`.
const STREAK_KINDS: [&str; 2] = ["milestone", "broken"];

/// Sinks seeded under `minewatch_dispatcher_failures_total`.
const SINKS: [&str; 2] = ["store", "notifier"];

/// Resolve `listen_addr` and `port` into a socket address.
///
/// `listen_addr` must be an IP literal; IPv6 addresses are accepted
/// without brackets (`::1`).
pub fn parse_listen_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    let ip: IpAddr = config.listen_addr.parse().map_err(|e| {
        anyhow::anyhow!(
            "invalid metrics listen address '{}': {}",
            config.listen_addr,
            e
        )
    })?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Install the global recorder, start the HTTP listener and seed the
/// labelled counters. Returns the bound address.
///
/// Call once per process.
///
/// # Errors
///
/// - The endpoint is not `/metrics`
/// - The listen address is not an IP literal
/// - Socket binding fails or a global recorder is already installed
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<SocketAddr> {
    if config.endpoint != "/metrics" {
        return Err(anyhow::anyhow!(
            "unsupported metrics endpoint '{}': the exporter only serves '/metrics'",
            config.endpoint
        ));
    }

    let addr = parse_listen_addr(config)?;
    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "player statistics are scrapeable on all interfaces"
        );
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    m::describe_all();
    seed_labelled_counters();

    tracing::info!(listen_addr = %addr, "metrics endpoint active");
    Ok(addr)
}

fn seed_labelled_counters() {
    for kind in EVENT_KINDS {
        metrics::counter!(m::LOG_PIPELINE_EVENTS_TOTAL, m::LABEL_KIND => kind).absolute(0);
    }
    for kind in STREAK_KINDS {
        metrics::counter!(m::LOG_PIPELINE_STREAK_NOTICES_TOTAL, m::LABEL_KIND => kind)
            .absolute(0);
    }
    for sink in SINKS {
        metrics::counter!(m::DISPATCHER_FAILURES_TOTAL, m::LABEL_SINK => sink).absolute(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(listen_addr: &str, port: u16) -> MetricsConfig {
        MetricsConfig {
            enabled: true,
            listen_addr: listen_addr.to_owned(),
            port,
            endpoint: "/metrics".to_owned(),
        }
    }

    #[test]
    fn ipv4_listen_addr() {
        let addr = parse_listen_addr(&config("127.0.0.1", 9100)).unwrap();
        assert_eq!(addr, "127.0.0.1:9100".parse().unwrap());
    }

    #[test]
    fn bare_ipv6_listen_addr() {
        let addr = parse_listen_addr(&config("::1", 9100)).unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 9100);
    }

    #[test]
    fn hostname_is_rejected() {
        let err = parse_listen_addr(&config("localhost", 9100)).unwrap_err();
        assert!(err.to_string().contains("localhost"));
    }
}
