use std::sync::OnceLock;

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload. Only one recorder can exist per
/// process, so repeated calls (tests build the app many times) hand back
/// the same handle.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            // Pre-register counters so they appear even before the first
            // increment.
            counter!("orders_executed_total").absolute(0);
            counter!("orders_rejected_total").absolute(0);
            counter!("orders_conflicted_total").absolute(0);
            counter!("snapshots_written_total").absolute(0);
            counter!("quote_cache_hits").absolute(0);
            counter!("quote_cache_misses").absolute(0);

            handle
        })
        .clone()
}
