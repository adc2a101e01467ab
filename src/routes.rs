// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{quiz, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the quiz and session sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (catalog, sessions, config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route(
            "/generate",
            get(quiz::generate_quiz).post(quiz::generate_quiz_from_catalog),
        )
        .route("/results", get(quiz::get_results));

    let session_routes = Router::new()
        .route("/", post(session::start_session))
        .route(
            "/{id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route("/{id}/answer", post(session::answer_question));

    Router::new()
        .nest("/api/quiz", quiz_routes)
        .nest("/api/sessions", session_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
