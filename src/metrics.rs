use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::{global, KeyValue};
use std::sync::OnceLock;
use std::time::Instant;

/// OpenTelemetry metrics for store operations.
///
/// Singleton instance accessed via `Metrics::get()`.
pub struct Metrics {
    pub operations_total: Counter<u64>,
    pub operation_duration: Histogram<f64>,
    pub errors_total: Counter<u64>,
    pub keys_scanned_total: Counter<u64>,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    pub fn init() -> &'static Self {
        METRICS.get_or_init(|| {
            let meter = global::meter("redis-store");

            Metrics {
                operations_total: meter
                    .u64_counter("redis_store_operations_total")
                    .with_description("Total number of store operations")
                    .init(),

                operation_duration: meter
                    .f64_histogram("redis_store_operation_duration_seconds")
                    .with_description("Store operation duration in seconds")
                    .init(),

                errors_total: meter
                    .u64_counter("redis_store_errors_total")
                    .with_description("Total number of failed store operations")
                    .init(),

                keys_scanned_total: meter
                    .u64_counter("redis_store_keys_scanned_total")
                    .with_description("Total number of keys returned by scans")
                    .init(),
            }
        })
    }

    pub fn get() -> &'static Self {
        METRICS.get().unwrap_or_else(Self::init)
    }

    pub fn record_operation(&self, operation: &str, backend: &str, duration: f64) {
        let labels = &[
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("backend", backend.to_string()),
        ];
        self.operations_total.add(1, labels);
        self.operation_duration.record(duration, labels);
    }

    pub fn record_error(&self, operation: &str, backend: &str, error_type: &str) {
        let labels = &[
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("backend", backend.to_string()),
            KeyValue::new("error_type", error_type.to_string()),
        ];
        self.errors_total.add(1, labels);
    }

    pub fn record_scan(&self, backend: &str, keys: u64) {
        self.keys_scanned_total
            .add(keys, &[KeyValue::new("backend", backend.to_string())]);
    }
}

/// Timer utility for measuring durations.
pub struct Timer {
    start: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
