use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::handlers::{health, heartbeat, join, leave, messages, signal, turn_status};
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origin);

    Router::new()
        .route("/health", get(health::health))
        .route("/messages", get(messages::get_messages).post(messages::post_message))
        .route("/voice/join", post(join::join))
        .route("/voice/heartbeat", post(heartbeat::heartbeat))
        .route("/voice/leave", post(leave::leave))
        .route("/voice/signal", post(signal::signal))
        .route("/voice/signals", get(signal::poll_signals))
        .route("/voice/turn/status", get(turn_status::turn_status))
        .with_state(state)
        .layer(cors)
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origin == "*" {
        return base.allow_origin(Any);
    }
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => base.allow_origin(origin),
        Err(_) => {
            warn!("invalid VOICE_RELAY_ALLOWED_ORIGIN {allowed_origin:?}, allowing any origin");
            base.allow_origin(Any)
        }
    }
}
