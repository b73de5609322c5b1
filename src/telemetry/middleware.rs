//! actix-web middleware opening one server span per inbound request.

use std::future::{ready, Future, Ready};
use std::pin::Pin;

use actix_web::body::MessageBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::HeaderMap;
use actix_web::HttpMessage;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{FutureExt, SpanBuilder, SpanKind, Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_semantic_conventions::attribute::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE, URL_PATH,
};

use crate::telemetry::trace::Tracer;

/// Middleware factory returned by [`Tracer::http_middleware`].
///
/// The parent context is read from the W3C `traceparent` header and the
/// request's span [`Context`] is stored in the request extensions so
/// handlers can start children from it.
#[derive(Clone)]
pub struct HttpTracing {
    tracer: Tracer,
}

impl HttpTracing {
    pub fn new(tracer: Tracer) -> Self {
        Self { tracer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HttpTracing
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = HttpTracingMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HttpTracingMiddleware {
            service,
            tracer: self.tracer.clone(),
        }))
    }
}

pub struct HttpTracingMiddleware<S> {
    service: S,
    tracer: Tracer,
}

impl<S, B> Service<ServiceRequest> for HttpTracingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let parent = TraceContextPropagator::new().extract(&RequestHeaders(req.headers()));

        let method = req.method().to_string();
        let route = req.match_pattern();
        let span_name = format!("{} {}", method, route.as_deref().unwrap_or(req.path()));

        let mut attributes = vec![
            KeyValue::new(HTTP_REQUEST_METHOD, method),
            KeyValue::new(URL_PATH, req.path().to_string()),
        ];
        if let Some(route) = route {
            attributes.push(KeyValue::new(HTTP_ROUTE, route));
        }

        let cx = self.tracer.start_span(
            SpanBuilder::from_name(span_name)
                .with_kind(SpanKind::Server)
                .with_attributes(attributes),
            &parent,
        );
        req.extensions_mut().insert(cx.clone());

        // Current while the inner service runs, so handler spans become children
        let fut = {
            let _guard = cx.clone().attach();
            self.service.call(req).with_context(cx.clone())
        };
        Box::pin(async move {
            let result = fut.await;
            let span = cx.span();

            match &result {
                Ok(res) => {
                    let status = res.status();
                    span.set_attribute(KeyValue::new(
                        HTTP_RESPONSE_STATUS_CODE,
                        i64::from(status.as_u16()),
                    ));
                    if status.is_server_error() {
                        span.set_status(Status::error(status.to_string()));
                    }
                }
                Err(err) => {
                    let status = err.as_response_error().status_code();
                    span.set_attribute(KeyValue::new(
                        HTTP_RESPONSE_STATUS_CODE,
                        i64::from(status.as_u16()),
                    ));
                    // Client errors stay unset on server spans
                    if status.is_server_error() {
                        span.set_status(Status::error(err.to_string()));
                    }
                }
            }
            span.end();

            result
        })
    }
}

struct RequestHeaders<'a>(&'a HeaderMap);

impl Extractor for RequestHeaders<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}
