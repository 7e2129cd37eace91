use axum::handler::Handler;
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, SEVERITY_PATHS, WARNING_PATHS};
use crate::state::AppState;

/// POST route whose GET explains how to call it.
fn post_only<H, T>(path: &'static str, handler: H) -> MethodRouter<Arc<AppState>>
where
    H: Handler<T, Arc<AppState>>,
    T: 'static,
{
    post(handler).get(move || handlers::method_guidance(path))
}

/// # Routes
///
/// - `GET /` - service info, endpoints and model-load flags
/// - `GET /test` - liveness
/// - `POST /severity`, `POST /predict-severity` - severity classification
/// - `POST /sepsis-warning`, `POST /predict`, `POST /sepsis-warnning` - early warning
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/", get(handlers::health))
        .route("/test", get(handlers::liveness));
    for path in SEVERITY_PATHS {
        router = router.route(path, post_only(path, handlers::severity));
    }
    for path in WARNING_PATHS {
        router = router.route(path, post_only(path, handlers::early_warning));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
