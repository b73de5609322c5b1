use actix_web::{get, web, App, HttpMessage, HttpRequest, HttpResponse, HttpServer, Responder};
use opentelemetry::metrics::Counter;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};
use otel_observer::telemetry::{self, Tracer};
use serde::Deserialize;
use std::env;
use tracing::{error, info};

#[derive(Deserialize)]
struct HelloQuery {
    user: Option<String>,
}

struct AppState {
    tracer: Tracer,
    greetings: Counter<u64>,
}

#[get("/")]
#[tracing::instrument(skip(req, query, state), fields(user))]
async fn hello(
    req: HttpRequest,
    query: web::Query<HelloQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let user = query.user.as_deref().unwrap_or("anonymous");
    tracing::Span::current().record("user", user);

    let parent = req.extensions().get::<Context>().cloned().unwrap_or_default();
    let cx = state.tracer.start_with_context("render-greeting", &parent);
    cx.span().set_attribute(KeyValue::new("user", user.to_string()));

    state.greetings.add(1, &[KeyValue::new("user", user.to_string())]);
    info!(user = user, "Hello endpoint called");
    cx.span().end();

    HttpResponse::Ok().body(format!("Hello, {}!", user))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let observer = telemetry::init().map_err(std::io::Error::other)?;

    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|_| std::io::Error::other("PORT must be a number"))?;

    info!("Starting server on port {}", port);

    let state = web::Data::new(AppState {
        tracer: observer.tracer().clone(),
        greetings: observer.meter().meter().u64_counter("greetings").build(),
    });
    let tracer = observer.tracer().clone();

    let served = HttpServer::new(move || {
        App::new()
            .wrap(tracer.http_middleware())
            .app_data(state.clone())
            .service(hello)
            .service(health)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await;

    if let Err(err) = observer.shutdown() {
        error!(error = %err, "telemetry shutdown failed");
    }

    served
}
