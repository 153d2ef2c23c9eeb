use crate::interface_adapters::handlers::{
    close_session, create_session, health, send_message, send_voice, webapp,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/create-session", post(create_session))
        .route("/send-message", post(send_message))
        .route("/send-voice", post(send_voice))
        .route("/close-session", post(close_session))
        .route("/health", get(health))
        .route("/webapp", get(webapp))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
