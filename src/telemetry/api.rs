use crate::telemetry::config::ObserverConfig;
use crate::telemetry::error::TelemetryError;
use crate::telemetry::observer::Observer;
use crate::telemetry::subscriber::init_subscriber;

/// Build an [`Observer`] from config and install the global `tracing`
/// subscriber on top of it.
///
/// If the subscriber cannot be installed the freshly built providers are
/// shut down before the error is returned.
pub fn init_with_config(config: &ObserverConfig) -> Result<Observer, TelemetryError> {
    let observer = Observer::from_config(config)?;

    if let Err(err) = init_subscriber(&observer, config) {
        // The subscriber error is the one worth reporting
        let _ = observer.shutdown();
        return Err(err);
    }

    Ok(observer)
}

/// Initialize telemetry from environment
pub fn init() -> Result<Observer, TelemetryError> {
    let config = ObserverConfig::from_env();
    init_with_config(&config)
}
