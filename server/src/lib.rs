//! C4 + the admin HTTP surface: router assembly factored out of `main`
//! so integration tests can bind the same app to an ephemeral port
//! instead of port 8080.

pub mod admin;
pub mod config_store;
pub mod connection;
pub mod rate_limiter;

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tower_http::services::{ServeDir, ServeFile};

/// Bound together once at startup and handed to every handler. The
/// Coordinator's own actor loop is spawned separately and outlives this
/// struct for as long as the process runs.
pub struct AppState {
    pub hub: Arc<engine::BroadcastHub>,
    pub coordinator: engine::GameCoordinatorHandle,
    pub playback: Arc<dyn engine::PlaybackAdapter>,
    pub admin_token: String,
}

/// Assembles the full router: the unauthenticated player WebSocket, the
/// authenticated admin HTTP surface from `spec.md` §4.4, and a static-file
/// fallback for whatever player/admin UI the host platform serves.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/admin/media_players", get(admin::media_players_handler))
        .route(
            "/admin/validate_playlist",
            post(admin::validate_playlist_handler),
        )
        .route("/admin/start_game", post(admin::start_game_handler))
        .route("/admin/next_song", post(admin::next_song_handler))
        .route("/admin/reset_game", post(admin::reset_game_handler))
        .with_state(state)
        .fallback_service(ServeDir::new(".").not_found_service(ServeFile::new("index.html")))
}

#[derive(Deserialize)]
struct WebSocketQuery {
    #[serde(default)]
    admin_token: Option<String>,
}

/// Upgrades the `/ws` request. A connection is treated as the admin
/// channel either because it presented the configured admin token as a
/// query parameter, or — when no token is configured — never; the device
/// secret minted at `start_game` is the other, always-available path to
/// admin for any client.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebSocketQuery>,
) -> impl IntoResponse {
    let is_admin_channel = !state.admin_token.is_empty()
        && query.admin_token.as_deref() == Some(state.admin_token.as_str());
    ws.on_upgrade(move |socket: WebSocket| connection::handle_socket(socket, state, is_admin_channel))
}
