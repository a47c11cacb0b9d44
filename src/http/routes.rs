use super::handlers;
use super::socket;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Real-time session events
        .route("/interpreter", get(socket::interpreter_socket))
        // Session queries
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/:session_id", get(handlers::get_session))
        // Request/response collaborators
        .route("/translate/text-to-sign", post(handlers::translate_text))
        .route("/translation/text-to-signs", post(handlers::translate_text))
        .route("/translation/signs-to-text", post(handlers::signs_to_text))
        .route("/sign-language/gestures", get(handlers::list_gestures))
        .route("/sign-language/recognize-stream", post(handlers::recognize_sign))
        .route("/speech/recognize-stream", post(handlers::recognize_speech))
        .route("/speech/synthesize", post(handlers::synthesize_speech))
        .route("/speech/text-to-speech", post(handlers::text_to_speech))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
