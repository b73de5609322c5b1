use opentelemetry::propagation::{Injector, TextMapPropagator};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tonic::metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// tonic client interceptor writing the current trace context into the
/// outgoing request metadata (`traceparent` / `tracestate`).
///
/// Server-side extraction is not provided.
#[derive(Clone, Debug, Default)]
pub struct TraceContextInterceptor {
    propagator: TraceContextPropagator,
}

impl TraceContextInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject `cx` instead of the current context
    pub fn inject_context(&self, cx: &Context, metadata: &mut MetadataMap) {
        self.propagator
            .inject_context(cx, &mut MetadataInjector(metadata));
    }
}

impl Interceptor for TraceContextInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        self.inject_context(&Context::current(), request.metadata_mut());
        Ok(request)
    }
}

struct MetadataInjector<'a>(&'a mut MetadataMap);

impl Injector for MetadataInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        // Invalid header names or values are dropped
        if let (Ok(key), Ok(value)) = (
            MetadataKey::<Ascii>::from_bytes(key.as_bytes()),
            MetadataValue::<Ascii>::try_from(value.as_str()),
        ) {
            self.0.insert(key, value);
        }
    }
}
