use std::sync::Arc;

use beatsy_server::{build_router, config_store, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
/// Activates structured tracing, loads the initial config, spawns the
/// Coordinator's actor loop, then serves the player WebSocket and the
/// admin HTTP surface. Listens on port 8080.
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let config = config_store::load_initial_config("GameConfig.json").await;
    let hub = Arc::new(engine::BroadcastHub::new());
    // `NullPlaybackAdapter` stands in for the host platform's real music
    // service, which is an external collaborator per the Non-goals. One
    // shared instance backs both the Coordinator and the admin HTTP
    // surface's read-only calls (`media_players`, `validate_playlist`), so
    // a real adapter's device state is never split across two handles.
    let playback: Arc<dyn engine::PlaybackAdapter> = Arc::new(engine::NullPlaybackAdapter::new());
    let (coordinator, handle) = engine::GameCoordinator::new(config, hub.clone(), playback.clone());
    tokio::spawn(coordinator.run());

    let admin_token = std::env::var("BEATSY_ADMIN_TOKEN").unwrap_or_default();
    if admin_token.is_empty() {
        tracing::warn!("BEATSY_ADMIN_TOKEN not set, admin HTTP routes are unauthenticated");
    }

    let state = Arc::new(AppState {
        hub,
        coordinator: handle,
        playback,
        admin_token,
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
