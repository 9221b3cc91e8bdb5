use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total search requests. Labels: status.
pub const SEARCHES_TOTAL: &str = "stashfind_searches_total";

/// Histogram: ranked search latency in seconds (store calls included).
pub const SEARCH_DURATION_SECONDS: &str = "stashfind_search_duration_seconds";

/// Histogram: results returned per successful search.
pub const SEARCH_RESULTS: &str = "stashfind_search_results";

// ── Pipeline metrics ────────────────────────────────────────────

/// Counter: candidates pulled from the resource provider.
pub const CANDIDATES_EVALUATED_TOTAL: &str = "stashfind_candidates_evaluated_total";

/// Counter: candidates dropped by a filter. Labels: reason.
pub const CANDIDATES_REJECTED_TOTAL: &str = "stashfind_candidates_rejected_total";

/// Gauge: stashpoints held by the in-memory store at startup.
pub const STASHPOINTS_LOADED: &str = "stashfind_stashpoints_loaded";

/// Install the fmt subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init_metrics(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
