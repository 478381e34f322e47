mod config;
mod error;
mod handlers;
mod inbox;
mod limiter;
mod messages;
mod reaper;
mod registry;
mod relay;
mod router;
mod state;

use std::net::SocketAddr;

use config::Config;
use state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "voice_relay=info".into()),
        )
        .init();

    let config = Config::from_env().expect("invalid configuration");
    let addr = format!("{}:{}", config.host, config.port);

    info!("voice-relay listening on {addr}");

    let state = AppState::new(config);
    reaper::spawn(
        state.registry.clone(),
        state.relay.clone(),
        state.config.reap_interval_secs,
    );
    let app = router::build(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
