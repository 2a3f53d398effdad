//! Optional observability hooks.
//!
//! With `metrics`, instruments are registered on the global OpenTelemetry
//! meter; install a meter provider to export them. With `tracing`, spans
//! wrap connection setup, pool acquisition and query execution.

#[cfg(feature = "metrics")]
pub use self::instruments::*;

#[cfg(feature = "metrics")]
mod instruments {
    use once_cell::sync::Lazy;
    use opentelemetry::{
        global,
        metrics::{Counter, Histogram},
        KeyValue,
    };
    use std::time::Duration;

    pub static METRICS: Lazy<ImpalaMetrics> = Lazy::new(ImpalaMetrics::init);

    pub struct ImpalaMetrics {
        pub queries_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub acquire_wait_duration: Histogram<f64>,
        pub acquire_timeouts_total: Counter<u64>,
    }

    impl ImpalaMetrics {
        pub fn init() -> Self {
            let meter = global::meter("impala_lite");

            let queries_total = meter
                .u64_counter("impala_lite_queries_total")
                .with_description("Total queries executed, by outcome")
                .build();

            let query_duration = meter
                .f64_histogram("impala_lite_query_duration_seconds")
                .with_description("Duration of metadata fetch plus execution")
                .with_unit("s")
                .build();

            let acquire_wait_duration = meter
                .f64_histogram("impala_lite_pool_acquire_wait_seconds")
                .with_description("Time callers waited for a pool permit")
                .with_unit("s")
                .build();

            let acquire_timeouts_total = meter
                .u64_counter("impala_lite_pool_acquire_timeouts_total")
                .with_description("Acquisitions that gave up waiting")
                .build();

            Self {
                queries_total,
                query_duration,
                acquire_wait_duration,
                acquire_timeouts_total,
            }
        }

        pub fn record_query(&self, elapsed: Duration, ok: bool) {
            let status = if ok { "ok" } else { "error" };
            self.queries_total.add(1, &[KeyValue::new("status", status)]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn observe_acquire_wait(&self, waited: Duration) {
            self.acquire_wait_duration.record(waited.as_secs_f64(), &[]);
        }

        pub fn record_acquire_timeout(&self) {
            self.acquire_timeouts_total.add(1, &[]);
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    pub fn connect_span(host: &str, port: u16) -> Span {
        info_span!("impala.connect", host = %host, port = port)
    }

    pub fn acquire_connection_span() -> Span {
        info_span!("impala.pool.acquire")
    }

    pub fn execute_query_span(sql: &str) -> Span {
        info_span!("impala.query", sql = %sql)
    }
}
