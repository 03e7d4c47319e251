pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use dvote_core::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(routes::meta::root))
        .route("/health", get(routes::meta::health))
        .route("/metrics", get(routes::meta::metrics))
        .route(
            "/polls",
            get(routes::polls::list_polls).post(routes::polls::create_poll),
        )
        .route("/polls/{poll_id}", get(routes::polls::get_poll))
        .route(
            "/polls/{poll_id}/votes/{voter_id}",
            get(routes::polls::get_voter_vote),
        )
        .route("/votes", post(routes::votes::cast_vote))
        .fallback(error::route_not_found)
}

/// The full service: routes, state, CORS and request tracing.
pub fn app(state: AppState) -> Router {
    build_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
