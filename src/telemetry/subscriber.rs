use tracing::{Metadata, Subscriber};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::telemetry::config::{LogFormat, ObserverConfig};
use crate::telemetry::error::TelemetryError;
use crate::telemetry::logs::Logger;
use crate::telemetry::observer::Observer;

// Crates whose own events would loop back into the log exporter.
const EXPORT_PIPELINE_TARGETS: [&str; 6] =
    ["opentelemetry", "hyper", "h2", "tonic", "tower", "reqwest"];

/// One JSON object per event, fields flattened, current span attached
pub fn build_json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(false)
}

/// Coloured multi-line output with source locations and span close timings
pub fn build_pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
}

/// `RUST_LOG` when it parses, otherwise [`ObserverConfig::log_level`]
pub fn build_filter(config: &ObserverConfig) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(&config.log_level),
    }
}

fn is_export_pipeline(target: &str) -> bool {
    EXPORT_PIPELINE_TARGETS.iter().any(|prefix| {
        target.strip_prefix(prefix).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with("::") || rest.starts_with('_')
        })
    })
}

/// `tracing` → OpenTelemetry log bridge, minus the export pipeline's own events
pub fn build_log_layer<S>(logger: &Logger) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    logger
        .layer()
        .with_filter(filter_fn(|metadata: &Metadata<'_>| !is_export_pipeline(metadata.target())))
}

/// Install the global `tracing` subscriber: env filter, OpenTelemetry span
/// layer, log bridge and a fmt layer in the configured format.
///
/// Fails if a global subscriber is already set.
pub fn init_subscriber(observer: &Observer, config: &ObserverConfig) -> Result<(), TelemetryError> {
    let otel_layer = observer.tracer().otel_layer();
    let log_layer = build_log_layer(observer.logger());
    let filter = build_filter(config);

    match config.log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(otel_layer)
                .with(log_layer)
                .with(build_pretty_layer())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(otel_layer)
                .with(log_layer)
                .with(build_json_layer())
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::exporter::ExporterConfig;
    use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLoggerProvider};
    use serial_test::serial;

    #[test]
    #[serial]
    fn build_filter_uses_config_log_level() {
        temp_env::with_var_unset("RUST_LOG", || {
            let config = ObserverConfig::new("test", "1.0").with_log_level("debug");

            let filter = build_filter(&config);

            assert_eq!(filter.to_string(), "debug");
        });
    }

    #[test]
    #[serial]
    fn build_filter_defaults_to_info() {
        temp_env::with_var_unset("RUST_LOG", || {
            let config = ObserverConfig::new("test", "1.0");

            let filter = build_filter(&config);

            assert_eq!(filter.to_string(), "info");
        });
    }

    #[test]
    #[serial]
    fn build_filter_prefers_rust_log() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            let config = ObserverConfig::new("test", "1.0").with_log_level("debug");

            let filter = build_filter(&config);

            assert_eq!(filter.to_string(), "warn");
        });
    }

    #[test]
    fn export_pipeline_targets_are_recognised() {
        assert!(is_export_pipeline("opentelemetry_sdk"));
        assert!(is_export_pipeline("hyper::client"));
        assert!(is_export_pipeline("tonic"));
        assert!(!is_export_pipeline("otel_observer::telemetry"));
        assert!(!is_export_pipeline("hyperion"));
    }

    #[test]
    fn log_layer_drops_export_pipeline_events() {
        let exporter = InMemoryLogExporter::default();
        let provider = SdkLoggerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let logger = Logger::from_provider("test", provider);

        let subscriber = tracing_subscriber::registry().with(build_log_layer(&logger));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "opentelemetry_sdk", "internal");
            tracing::info!(target: "checkout", "order placed");
        });

        assert_eq!(exporter.get_emitted_logs().unwrap().len(), 1);
    }

    #[test]
    fn otel_layer_is_present_for_console_tracer() {
        let observer = Observer::from_parts(
            "test",
            ExporterConfig::development(),
            crate::telemetry::trace::Tracer::new("test", &ExporterConfig::development()).unwrap(),
            crate::telemetry::metrics::Meter::new("test", &ExporterConfig::development()).unwrap(),
            Logger::new("test", &ExporterConfig::development()).unwrap(),
            Default::default(),
        );

        assert!(observer
            .tracer()
            .otel_layer::<tracing_subscriber::Registry>()
            .is_some());
        assert!(observer.shutdown().is_ok());
    }
}
