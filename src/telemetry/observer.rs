use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::telemetry::config::{ObserverConfig, ShutdownPolicy};
use crate::telemetry::error::TelemetryError;
use crate::telemetry::exporter::ExporterConfig;
use crate::telemetry::logs::Logger;
use crate::telemetry::metrics::Meter;
use crate::telemetry::resource::ServiceInfo;
use crate::telemetry::trace::Tracer;

/// Owns the tracer, meter and logger of one service and shuts them down
/// together.
pub struct Observer {
    name: String,
    exporter: ExporterConfig,
    tracer: Tracer,
    meter: Meter,
    logger: Logger,
    policy: ShutdownPolicy,
    shut_down: AtomicBool,
}

impl Observer {
    /// Build trace, metric and log providers in that order and register the
    /// tracer and meter providers process-wide.
    pub fn new(name: &str, exporter: &ExporterConfig) -> Result<Self, TelemetryError> {
        Self::build(ServiceInfo::new(name), exporter, ShutdownPolicy::default(), true)
    }

    /// Build from a full [`ObserverConfig`]
    pub fn from_config(config: &ObserverConfig) -> Result<Self, TelemetryError> {
        Self::build(
            ServiceInfo::from(config),
            &config.exporter(),
            config.shutdown_policy,
            config.register_global,
        )
    }

    /// Assemble from existing handles. Nothing is registered process-wide.
    pub fn from_parts(
        name: impl Into<String>,
        exporter: ExporterConfig,
        tracer: Tracer,
        meter: Meter,
        logger: Logger,
        policy: ShutdownPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            exporter,
            tracer,
            meter,
            logger,
            policy,
            shut_down: AtomicBool::new(false),
        }
    }

    fn build(
        service: ServiceInfo,
        exporter: &ExporterConfig,
        policy: ShutdownPolicy,
        register_global: bool,
    ) -> Result<Self, TelemetryError> {
        let tracer = Tracer::new(service.clone(), exporter)?;

        let meter = match Meter::new(service.clone(), exporter) {
            Ok(meter) => meter,
            Err(err) => {
                discard(&[tracer.shutdown()]);
                return Err(err);
            }
        };

        let logger = match Logger::new(service.clone(), exporter) {
            Ok(logger) => logger,
            Err(err) => {
                discard(&[meter.shutdown(), tracer.shutdown()]);
                return Err(err);
            }
        };

        if register_global {
            tracer.install_global();
            meter.install_global();
        }

        info!(
            target: "otel_lifecycle",
            service = %service.name,
            exporter = %exporter.kind,
            "observer initialised"
        );

        Ok(Self::from_parts(
            service.name,
            exporter.clone(),
            tracer,
            meter,
            logger,
            policy,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exporter(&self) -> &ExporterConfig {
        &self.exporter
    }

    /// Trace instrumentation: spans, HTTP middleware, gRPC interceptor
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Metric instrumentation
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Log instrumentation: the `tracing` bridge layer
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        self.policy
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Shut down the metric, log and trace providers in that order.
    ///
    /// Blocks until the SDK providers return. With
    /// [`ShutdownPolicy::BestEffort`] every provider is asked to shut down and
    /// all failures come back in [`TelemetryError::ShutdownFailed`]; with
    /// [`ShutdownPolicy::FailFast`] the first failure is returned and the
    /// remaining providers are left running.
    ///
    /// Only the first call does any work; later calls return
    /// [`TelemetryError::AlreadyShutdown`].
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Err(TelemetryError::AlreadyShutdown);
        }

        match self.policy {
            ShutdownPolicy::FailFast => {
                self.meter.shutdown()?;
                self.logger.shutdown()?;
                self.tracer.shutdown()?;
            }
            ShutdownPolicy::BestEffort => {
                let errors: Vec<TelemetryError> = [
                    self.meter.shutdown(),
                    self.logger.shutdown(),
                    self.tracer.shutdown(),
                ]
                .into_iter()
                .filter_map(Result::err)
                .collect();

                if !errors.is_empty() {
                    return Err(TelemetryError::ShutdownFailed(errors));
                }
            }
        }

        info!(target: "otel_lifecycle", service = %self.name, "observer shut down");
        Ok(())
    }
}

// Rollback after a failed build: the build error is what the caller sees.
fn discard(results: &[Result<(), TelemetryError>]) {
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        warn!(target: "otel_lifecycle", error = %err, "rollback shutdown failed");
    }
}
