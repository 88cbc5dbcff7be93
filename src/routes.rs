// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{exam, session},
    state::AppState,
    utils::identity::identity_middleware,
};

/// Assembles the main application router.
///
/// * Configuration preview routes are open (no identity needed).
/// * Session routes require the caller-supplied identity header.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (the session service).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static("x-user-id"),
        ]);

    let preview_routes = Router::new()
        .route("/{certification_id}/validate", post(exam::validate_configuration))
        .route("/{certification_id}/generate", post(exam::generate_exam));

    let session_routes = Router::new()
        .route("/{certification_id}/start", post(session::start_session))
        .route("/sessions/{session_id}", get(session::get_session))
        .route("/sessions/{session_id}/answers", put(session::save_answer))
        .route("/sessions/{session_id}/submit", post(session::submit_session))
        .route("/sessions/{session_id}/result", get(session::get_result))
        .layer(middleware::from_fn(identity_middleware));

    Router::new()
        .nest("/api/exam", preview_routes.merge(session_routes))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
