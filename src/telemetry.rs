use opentelemetry::global;
use opentelemetry_sdk::metrics::MeterProvider;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub struct TelemetryConfig {
    pub enable_metrics: bool,
    /// Default log directive when `RUST_LOG` is unset.
    pub log_level: &'static str,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_level: "warn",
        }
    }
}

/// Install the tracing subscriber and, when enabled, a global meter provider.
///
/// `RUST_LOG` takes precedence over `log_level`.
pub fn init_telemetry(config: &TelemetryConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if !config.enable_metrics {
        info!("Metrics collection disabled");
        return;
    }

    let provider = MeterProvider::builder().build();
    global::set_meter_provider(provider);
    crate::metrics::Metrics::init();

    info!("OpenTelemetry metrics initialized");
}
