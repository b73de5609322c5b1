use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_NAME, SERVICE_VERSION,
};
use opentelemetry_semantic_conventions::SCHEMA_URL;

use crate::telemetry::config::{Environment, ObserverConfig};
use crate::telemetry::error::TelemetryError;

/// Identity of the service every provider reports as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub version: Option<String>,
    pub environment: Option<Environment>,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            environment: None,
        }
    }
}

impl From<&str> for ServiceInfo {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceInfo {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&ObserverConfig> for ServiceInfo {
    fn from(config: &ObserverConfig) -> Self {
        Self {
            name: config.service_name.clone(),
            version: Some(config.service_version.clone()),
            environment: Some(config.environment),
        }
    }
}

/// Attributes of the service-tagged resource
pub fn service_attributes(service: &ServiceInfo) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new(SERVICE_NAME, service.name.clone())];

    if let Some(version) = &service.version {
        attrs.push(KeyValue::new(SERVICE_VERSION, version.clone()));
    }

    if let Some(environment) = service.environment {
        attrs.push(KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, environment.as_str()));
    }

    attrs
}

/// Merge the SDK default resource (SDK, telemetry and `OTEL_RESOURCE_ATTRIBUTES`
/// detectors) with the service-tagged resource.
///
/// Fails when the default resource already carries a different schema URL.
pub fn build_resource(service: &ServiceInfo) -> Result<Resource, TelemetryError> {
    let defaults = Resource::builder().build();
    // No built-in detector sets a schema URL today; one that does must agree
    check_schema(defaults.schema_url(), SCHEMA_URL)?;

    // Values of the merged-in resource win, so the detected
    // `unknown_service` name gives way to the configured one.
    // `Resource::merge` is crate-private in the SDK, so the merge goes through
    // the builder: defaults first, then the tagged attributes and schema URL.
    let default_attrs = defaults.iter().map(|(k, v)| KeyValue::new(k.clone(), v.clone()));
    let builder = match defaults.schema_url() {
        Some(url) => Resource::builder_empty().with_schema_url(default_attrs, url.to_owned()),
        None => Resource::builder_empty().with_attributes(default_attrs),
    };
    Ok(builder
        .with_attributes(service_attributes(service))
        .with_schema_url(Vec::new(), SCHEMA_URL)
        .build())
}

fn check_schema(existing: Option<&str>, incoming: &str) -> Result<(), TelemetryError> {
    match existing {
        Some(existing) if !existing.is_empty() && existing != incoming => {
            Err(TelemetryError::Resource(format!(
                "conflicting schema URLs: {existing} and {incoming}"
            )))
        }
        _ => Ok(()),
    }
}
