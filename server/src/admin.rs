//! HTTP surface for admin control: listing playback targets, validating a
//! playlist before committing to it, and the three privileged game
//! commands. Every handler here is implicitly `is_admin_channel = true` —
//! reaching these routes at all is gated by [`check_admin_auth`], which
//! stands in for whatever authentication the host platform's existing
//! admin surface already performs (Non-goal: no cryptographic player
//! authentication is built here).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::AppState;

/// Checks the `Authorization: Bearer <token>` header against the token
/// configured at startup. An empty configured token disables the check
/// entirely, which is convenient for local development but should never
/// be left empty in anything reachable beyond a trusted local network.
pub fn check_admin_auth(headers: &HeaderMap, expected_token: &str) -> bool {
    if expected_token.is_empty() {
        return true;
    }
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    value
        .strip_prefix("Bearer ")
        .is_some_and(|token| token == expected_token)
}

fn unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, "missing or invalid admin token").into_response()
}

fn engine_error_response(error: engine::EngineError) -> impl IntoResponse {
    let api_error: protocol::ApiError = error.into();
    (StatusCode::BAD_REQUEST, Json(api_error)).into_response()
}

#[derive(Serialize)]
struct MediaPlayersResponse {
    targets: Vec<MediaPlayerInfo>,
}

#[derive(Serialize)]
struct MediaPlayerInfo {
    id: String,
    friendly_name: String,
    state: String,
}

pub async fn media_players_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !check_admin_auth(&headers, &state.admin_token) {
        return unauthorized().into_response();
    }
    match state.playback.list_playback_targets().await {
        Ok(targets) => Json(MediaPlayersResponse {
            targets: targets
                .into_iter()
                .map(|t| MediaPlayerInfo {
                    id: t.id,
                    friendly_name: t.friendly_name,
                    state: t.state,
                })
                .collect(),
        })
        .into_response(),
        Err(error) => engine_error_response(error).into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct ValidatePlaylistRequest {
    playlist_id: String,
}

#[derive(Serialize)]
struct ValidatePlaylistResponse {
    song_count: usize,
    skipped_count: u32,
}

pub async fn validate_playlist_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ValidatePlaylistRequest>,
) -> impl IntoResponse {
    if !check_admin_auth(&headers, &state.admin_token) {
        return unauthorized().into_response();
    }
    match state.playback.load_playlist(&request.playlist_id).await {
        Ok(loaded) => Json(ValidatePlaylistResponse {
            song_count: loaded.songs.len(),
            skipped_count: loaded.skipped_count,
        })
        .into_response(),
        Err(error) => engine_error_response(error).into_response(),
    }
}

#[derive(serde::Deserialize, Default)]
pub struct StartGameRequest {
    #[serde(default)]
    config: protocol::GameConfigOverrides,
}

#[derive(Serialize)]
struct StartGameResponse {
    admin_secret: String,
}

pub async fn start_game_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<StartGameRequest>,
) -> impl IntoResponse {
    if !check_admin_auth(&headers, &state.admin_token) {
        return unauthorized().into_response();
    }
    match state
        .coordinator
        .start_game(request.config, None, true, None)
        .await
    {
        Ok(outcome) => Json(StartGameResponse {
            admin_secret: outcome.admin_secret,
        })
        .into_response(),
        Err(error) => engine_error_response(error).into_response(),
    }
}

pub async fn next_song_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !check_admin_auth(&headers, &state.admin_token) {
        return unauthorized().into_response();
    }
    match state.coordinator.next_song(None, true).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => engine_error_response(error).into_response(),
    }
}

pub async fn reset_game_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !check_admin_auth(&headers, &state.admin_token) {
        return unauthorized().into_response();
    }
    match state.coordinator.stop_game(None, true).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => engine_error_response(error).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_disables_check() {
        assert!(check_admin_auth(&HeaderMap::new(), ""));
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(!check_admin_auth(&HeaderMap::new(), "secret"));
    }

    #[test]
    fn matching_bearer_token_is_authorized() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer secret".parse().unwrap(),
        );
        assert!(check_admin_auth(&headers, "secret"));
    }

    #[test]
    fn wrong_bearer_token_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong".parse().unwrap(),
        );
        assert!(!check_admin_auth(&headers, "secret"));
    }
}
