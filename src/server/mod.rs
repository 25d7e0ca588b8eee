pub mod handlers;
mod openapi;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use tracing::Instrument;

use crate::providers::WorkItemTracker;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<dyn WorkItemTracker>,
    /// Project scope for single-item fetches.
    pub project_id: Arc<str>,
}

impl AppState {
    pub fn new(tracker: Arc<dyn WorkItemTracker>, project_id: String) -> Self {
        Self {
            tracker,
            project_id: project_id.into(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/openapi.json", get(handlers::openapi))
        .route("/workitems", get(handlers::list_work_items))
        .route(
            "/user-story/:work_item_id/description",
            get(handlers::get_description),
        )
        .route(
            "/user-story/:work_item_id/update-criteria",
            put(handlers::update_criteria),
        )
        .layer(middleware::from_fn(trace_requests))
        .with_state(state)
}

/// Route template such as `/user-story/:work_item_id/description`, or the raw
/// path when nothing matched.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

async fn trace_requests(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        route = %route_label(&request),
    );
    let started = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request complete"
        );
    });
    response
}
