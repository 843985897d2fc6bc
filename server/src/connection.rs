//! C4: WebSocket lifecycle, message framing, command dispatch, heartbeat.
//!
//! One reader task and one writer task per connection, split the same way
//! the teacher's relay topology splits a socket — whichever task finishes
//! first (peer close, protocol violation, lagging queue) causes the other
//! to be aborted and the connection torn down.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;

use protocol::{ApiError, ClientCommand, ErrorCode, EventEnvelope, EventPayload};

use crate::rate_limiter::ConnectionRateLimiters;
use crate::AppState;

/// Ping cadence; a missed pong past [`PONG_TIMEOUT`] forces a disconnect.
/// Must stay well below `PONG_TIMEOUT` — an idle-but-healthy client needs at
/// least one round trip to land before the reader's deadline expires, or
/// every connection gets force-closed before a single pong is possible.
const PING_INTERVAL: Duration = Duration::from_secs(10);
const PONG_TIMEOUT: Duration = Duration::from_secs(20);

const MAX_NAME_LEN: usize = 20;

/// Drives one upgraded WebSocket end to end: registers with the
/// [`engine::BroadcastHub`], then runs the reader and writer halves until
/// either exits, then unregisters.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>, is_admin_channel: bool) {
    let (sender, receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));
    let (connection_id, outbound_rx) = state.hub.register();

    let mut writer_task = tokio::spawn(writer_logic(sender, outbound_rx));
    let mut reader_task = tokio::spawn(reader_logic(
        receiver,
        state.clone(),
        connection_id,
        is_admin_channel,
    ));

    let reason = tokio::select! {
        res = &mut writer_task => { reader_task.abort(); res.unwrap_or("writer task panicked") },
        res = &mut reader_task => { writer_task.abort(); res.unwrap_or("reader task panicked") },
    };

    tracing::info!(connection_id, reason, "connection closed");
    state.hub.unregister(connection_id);
}

/// Drains the Hub's outbound queue for this connection and forwards each
/// event as a JSON text frame; also owns the heartbeat ping.
async fn writer_logic(
    sender: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    mut outbound_rx: tokio::sync::mpsc::Receiver<Arc<EventEnvelope>>,
) -> &'static str {
    let mut enclosed = sender.lock().await;
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            event = outbound_rx.recv() => {
                let Some(event) = event else {
                    return "outbound queue closed";
                };
                let text = match serde_json::to_string(event.as_ref()) {
                    Ok(text) => text,
                    Err(error) => {
                        tracing::error!(?error, "failed to serialize outbound event");
                        continue;
                    }
                };
                if let Err(error) = enclosed.send(Message::Text(text.into())).await {
                    tracing::warn!(?error, "failed writing to socket");
                    return "write failed";
                }
            }
            _ = ping_interval.tick() => {
                if let Err(error) = enclosed.send(Message::Ping(Vec::new().into())).await {
                    tracing::warn!(?error, "failed sending ping");
                    return "write failed";
                }
            }
        }
    }
}

/// Reads inbound frames, validates and rate-limits them, then dispatches
/// to the [`engine::GameCoordinatorHandle`]. Errors from a command are
/// replied to this connection only, never broadcast.
async fn reader_logic(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection_id: engine::ConnectionId,
    is_admin_channel: bool,
) -> &'static str {
    let mut limiters = ConnectionRateLimiters::default();
    let mut last_pong = Instant::now();

    loop {
        let deadline = tokio::time::Instant::from_std(last_pong) + PONG_TIMEOUT;
        let message = tokio::select! {
            message = receiver.next() => message,
            _ = tokio::time::sleep_until(deadline) => {
                return "pong timeout";
            }
        };
        let Some(message) = message else {
            return "connection lost";
        };
        let message = match message {
            Ok(message) => message,
            Err(error) => {
                tracing::debug!(?error, connection_id, "socket read error");
                return "connection lost";
            }
        };

        match message {
            Message::Text(text) => {
                handle_text_frame(&text, &state, connection_id, is_admin_channel, &mut limiters)
                    .await;
            }
            Message::Pong(_) => {
                last_pong = Instant::now();
            }
            Message::Close(_) => {
                return "client closed connection";
            }
            Message::Binary(_) | Message::Ping(_) => {
                // Binary frames aren't part of this protocol; axum answers
                // inbound pings automatically.
            }
        }
    }
}

async fn handle_text_frame(
    text: &str,
    state: &Arc<AppState>,
    connection_id: engine::ConnectionId,
    is_admin_channel: bool,
    limiters: &mut ConnectionRateLimiters,
) {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(error) => {
            tracing::debug!(?error, connection_id, "unparseable client message");
            reply_error(
                state,
                connection_id,
                ErrorCode::UnknownCommand,
                "message did not match any known command",
            );
            return;
        }
    };

    if limiters.should_limit(&command) {
        reply_error(
            state,
            connection_id,
            ErrorCode::RateLimited,
            "too many requests of this kind, slow down",
        );
        return;
    }

    if let Err(error) = validate(&command) {
        reply_error(state, connection_id, error.code, &error.message);
        return;
    }

    dispatch(command, state, connection_id, is_admin_channel).await;
}

/// Connection-Layer input validation: name length/charset and year range
/// (redundant with the Coordinator's own check, but a malformed year
/// never needs to cross the command boundary at all).
fn validate(command: &ClientCommand) -> Result<(), ApiError> {
    match command {
        ClientCommand::JoinGame { name } => validate_name(name),
        ClientCommand::SubmitGuess { year, .. } => {
            if !(0..=9999).contains(year) {
                return Err(ApiError::new(
                    ErrorCode::YearOutOfRange,
                    "year must be a plausible four-digit year",
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(ApiError::new(
            ErrorCode::InvalidName,
            format!("name must be 1-{MAX_NAME_LEN} characters"),
        ));
    }
    if !trimmed.chars().all(|c| c.is_alphanumeric() || c == ' ') {
        return Err(ApiError::new(
            ErrorCode::InvalidName,
            "name must be alphanumeric characters and spaces only",
        ));
    }
    Ok(())
}

async fn dispatch(
    command: ClientCommand,
    state: &Arc<AppState>,
    connection_id: engine::ConnectionId,
    is_admin_channel: bool,
) {
    let result = match command {
        ClientCommand::JoinGame { name } => {
            match state.coordinator.join_game(name, is_admin_channel).await {
                Ok(outcome) => {
                    state.hub.bind_player(connection_id, outcome.resolved_name);
                    Ok(())
                }
                Err(error) => Err(error),
            }
        }
        ClientCommand::Reconnect { session_id } => {
            match state.coordinator.reconnect(session_id).await {
                Ok(outcome) => {
                    state
                        .hub
                        .bind_player(connection_id, outcome.player_name.clone());
                    // `player_reconnected` is private to the reconnecting
                    // client (spec §6); deliver it directly rather than
                    // broadcasting, the same way `start_game`'s admin secret
                    // is handed only to the caller that minted it.
                    let event = EventEnvelope::new(EventPayload::PlayerReconnected(
                        protocol::PlayerReconnectedData {
                            player_name: outcome.player_name,
                            state_snapshot: outcome.snapshot,
                        },
                    ));
                    state.hub.send_to(connection_id, event);
                    Ok(())
                }
                Err(error) => Err(error),
            }
        }
        ClientCommand::PlaceBet { name, bet } => state.coordinator.place_bet(name, bet).await,
        ClientCommand::SubmitGuess { name, year, bet } => {
            state.coordinator.submit_guess(name, year, bet).await
        }
        ClientCommand::StartGame {
            config,
            admin_secret,
        } => state
            .coordinator
            // The Coordinator delivers the `game_reset` carrying the
            // secret straight to `connection_id` and excludes it from the
            // public broadcast, so this connection sees exactly one
            // `game_reset` instead of both.
            .start_game(config, admin_secret, is_admin_channel, Some(connection_id))
            .await
            .map(|_outcome| ()),
        ClientCommand::NextSong { admin_secret } => {
            state
                .coordinator
                .next_song(admin_secret, is_admin_channel)
                .await
        }
        ClientCommand::StopGame { admin_secret } => {
            state
                .coordinator
                .stop_game(admin_secret, is_admin_channel)
                .await
        }
    };

    if let Err(error) = result {
        reply_error(state, connection_id, error.code, &error.message);
    }
}

fn reply_error(state: &Arc<AppState>, connection_id: engine::ConnectionId, code: ErrorCode, message: &str) {
    let event = EventEnvelope::new(EventPayload::Error(ApiError::new(code, message)));
    state.hub.send_to(connection_id, event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        let result = validate_name("");
        assert!(result.is_err());
    }

    #[test]
    fn overlong_name_is_rejected() {
        let result = validate_name(&"x".repeat(MAX_NAME_LEN + 1));
        assert!(result.is_err());
    }

    #[test]
    fn reasonable_name_is_accepted() {
        assert!(validate_name("Sarah").is_ok());
        assert!(validate_name("Sarah J 2").is_ok());
    }

    #[test]
    fn punctuation_in_name_is_rejected() {
        assert!(validate_name("Sarah!").is_err());
        assert!(validate_name("<script>").is_err());
    }

    #[test]
    fn implausible_year_is_rejected() {
        let command = ClientCommand::SubmitGuess {
            name: "Sarah".into(),
            year: 99999,
            bet: false,
        };
        assert!(validate(&command).is_err());
    }
}
