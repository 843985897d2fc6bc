//! C1: the Game Coordinator. Owns the entire mutable state and is the
//! only task ever allowed to touch it — every other component talks to
//! it exclusively through [`Command`]s on an `mpsc` channel, which gives
//! the whole engine a single, easy-to-reason-about serialization
//! boundary (grounded in the same single-consumer actor shape as a
//! typical real-time game server's authoritative loop).

use std::collections::HashSet;
use std::sync::Arc;

use rand::RngCore;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant as TokioInstant;

use protocol::{
    BetPlacedData, EventEnvelope, EventPayload, GameResetData, GuessSubmittedData,
    PlayerJoinedData, ReconnectSnapshot, RoundStartedData, RoundSummary,
};

use crate::broadcast_hub::BroadcastHub;
use crate::commands::{
    authorize_admin, Command, JoinOutcome, ReconnectOutcome, Responder, StartGameOutcome,
};
use crate::config::GameConfig;
use crate::error::{engine_error, EngineError};
use crate::playback::{PlaybackAdapter, PLAYBACK_CALL_TIMEOUT};
use crate::round_engine;
use crate::state::{GameState, GameStatus, Guess, Player};

/// How many times `next_song` will draw a fresh song and retry `play`
/// before giving up and surfacing a `playback_failed` error to the admin
/// (spec's `pool_exhausted_or_broken` retry policy).
const PLAY_RETRY_ATTEMPTS: u32 = 3;

/// Command queue depth. Generous because a burst of joins at party start
/// should never need backpressure; the per-connection rate limiter in
/// the Connection Layer is what actually protects the Coordinator.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct GameCoordinatorHandle {
    sender: mpsc::Sender<Command>,
}

impl GameCoordinatorHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(build(tx)).await.is_err() {
            return Err(engine_error!(GameEnded, "coordinator has shut down"));
        }
        rx.await
            .unwrap_or_else(|_| Err(engine_error!(GameEnded, "coordinator dropped the reply")))
    }

    pub async fn join_game(
        &self,
        name: String,
        is_admin_channel: bool,
    ) -> Result<JoinOutcome, EngineError> {
        self.call(|respond| Command::JoinGame {
            name,
            is_admin_channel,
            respond,
        })
        .await
    }

    pub async fn reconnect(&self, session_id: String) -> Result<ReconnectOutcome, EngineError> {
        self.call(|respond| Command::Reconnect {
            session_id,
            respond,
        })
        .await
    }

    pub async fn place_bet(&self, name: String, bet: bool) -> Result<(), EngineError> {
        self.call(|respond| Command::PlaceBet { name, bet, respond })
            .await
    }

    pub async fn submit_guess(
        &self,
        name: String,
        year: i32,
        bet: bool,
    ) -> Result<(), EngineError> {
        self.call(|respond| Command::SubmitGuess {
            name,
            year,
            bet,
            respond,
        })
        .await
    }

    pub async fn start_game(
        &self,
        config: protocol::GameConfigOverrides,
        admin_secret: Option<String>,
        is_admin_channel: bool,
        requesting_connection: Option<crate::broadcast_hub::ConnectionId>,
    ) -> Result<StartGameOutcome, EngineError> {
        self.call(|respond| Command::StartGame {
            config,
            admin_secret,
            is_admin_channel,
            requesting_connection,
            respond,
        })
        .await
    }

    pub async fn next_song(
        &self,
        admin_secret: Option<String>,
        is_admin_channel: bool,
    ) -> Result<(), EngineError> {
        self.call(|respond| Command::NextSong {
            admin_secret,
            is_admin_channel,
            respond,
        })
        .await
    }

    pub async fn stop_game(
        &self,
        admin_secret: Option<String>,
        is_admin_channel: bool,
    ) -> Result<(), EngineError> {
        self.call(|respond| Command::StopGame {
            admin_secret,
            is_admin_channel,
            respond,
        })
        .await
    }
}

pub struct GameCoordinator {
    state: GameState,
    hub: Arc<BroadcastHub>,
    playback: Arc<dyn PlaybackAdapter>,
    receiver: mpsc::Receiver<Command>,
    self_sender: mpsc::Sender<Command>,
}

impl GameCoordinator {
    pub fn new(
        config: GameConfig,
        hub: Arc<BroadcastHub>,
        playback: Arc<dyn PlaybackAdapter>,
    ) -> (Self, GameCoordinatorHandle) {
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let coordinator = Self {
            state: GameState::new(config),
            hub,
            playback,
            receiver,
            self_sender: sender.clone(),
        };
        (coordinator, GameCoordinatorHandle { sender })
    }

    pub async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            tracing::debug!(command = command.name(), "dispatching command");
            self.handle(command).await;
        }
        tracing::info!("coordinator command channel closed, shutting down");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::JoinGame {
                name,
                is_admin_channel,
                respond,
            } => self.on_join_game(name, is_admin_channel, respond),
            Command::Reconnect {
                session_id,
                respond,
            } => self.on_reconnect(session_id, respond),
            Command::PlaceBet { name, bet, respond } => self.on_place_bet(name, bet, respond),
            Command::SubmitGuess {
                name,
                year,
                bet,
                respond,
            } => self.on_submit_guess(name, year, bet, respond),
            Command::StartGame {
                config,
                admin_secret,
                is_admin_channel,
                requesting_connection,
                respond,
            } => {
                self.on_start_game(
                    config,
                    admin_secret,
                    is_admin_channel,
                    requesting_connection,
                    respond,
                )
                .await
            }
            Command::NextSong {
                admin_secret,
                is_admin_channel,
                respond,
            } => self.on_next_song(admin_secret, is_admin_channel, respond).await,
            Command::StopGame {
                admin_secret,
                is_admin_channel,
                respond,
            } => {
                self.on_stop_game(admin_secret, is_admin_channel, respond)
                    .await
            }
            Command::DeadlineExpired { round_number } => self.on_deadline_expired(round_number),
        }
    }

    fn broadcast(&self, payload: EventPayload) {
        self.hub.broadcast(EventEnvelope::new(payload));
    }

    fn authorized(&self, admin_secret: &Option<String>, is_admin_channel: bool) -> bool {
        authorize_admin(admin_secret, is_admin_channel, &self.state.admin_secret)
    }

    fn on_join_game(
        &mut self,
        name: String,
        is_admin_channel: bool,
        respond: Responder<JoinOutcome>,
    ) {
        let outcome = (|| {
            if self.state.status == GameStatus::Ended {
                return Err(engine_error!(GameEnded, "game has already ended"));
            }
            let resolved_name = self.state.resolve_name(&name);
            let session_id = random_hex_token();
            self.state.players.push(Player {
                name: resolved_name.clone(),
                session_id: session_id.clone(),
                total_points: 0,
                is_admin: is_admin_channel,
                connected: true,
            });
            if self.state.status == GameStatus::Setup {
                self.state.status = GameStatus::Lobby;
            }
            Ok(JoinOutcome {
                resolved_name,
                session_id,
                is_admin: is_admin_channel,
            })
        })();

        if let Ok(outcome) = &outcome {
            self.broadcast(EventPayload::PlayerJoined(PlayerJoinedData {
                player_name: outcome.resolved_name.clone(),
                total_players: self.state.players.len() as u32,
            }));
        }
        let _ = respond.send(outcome);
    }

    /// `player_reconnected` is a private event (spec §6: "sent only to that
    /// client") — this handler only computes the snapshot and hands it back
    /// through `ReconnectOutcome`; the Connection Layer is responsible for
    /// delivering it to the reconnecting connection alone via `hub.send_to`,
    /// the same way it delivers the `start_game` admin secret.
    fn on_reconnect(&mut self, session_id: String, respond: Responder<ReconnectOutcome>) {
        let outcome = (|| {
            let player_name = self
                .state
                .player_by_session(&session_id)
                .map(|p| p.name.clone())
                .ok_or_else(|| engine_error!(SessionUnknown, "no player for this session"))?;

            if let Some(player) = self.state.player_by_name_mut(&player_name) {
                player.connected = true;
            }

            let has_submitted = self
                .state
                .current_round
                .as_ref()
                .map(|round| round.guesses.contains_key(&player_name))
                .unwrap_or(false);
            let current_round = self.state.current_round.as_ref().map(|round| RoundSummary {
                number: round.number,
                song: round.song.summary(),
                timer_duration_secs: self.state.config.timer_duration_secs,
                started_at: round.started_at_wall,
                correct_year: (!round.is_active()).then_some(round.song.year),
                has_submitted,
            });

            Ok(ReconnectOutcome {
                player_name: player_name.clone(),
                snapshot: ReconnectSnapshot {
                    game_status: self.state.status.to_string(),
                    players: self.state.players.iter().map(Player::summary).collect(),
                    current_round,
                },
            })
        })();

        let _ = respond.send(outcome);
    }

    fn on_place_bet(&mut self, name: String, _bet: bool, respond: Responder<()>) {
        let result = (|| {
            self.state
                .player_by_name(&name)
                .ok_or_else(|| engine_error!(SessionUnknown, "unknown player {name}"))?;
            let round = self
                .state
                .current_round
                .as_ref()
                .filter(|r| r.is_active())
                .ok_or_else(|| engine_error!(NoActiveRound, "no round is currently active"))?;
            if !round.eligible_players.contains(&name) {
                return Err(engine_error!(
                    NoActiveRound,
                    "{name} joined after this round started"
                ));
            }
            if round.guesses.contains_key(&name) {
                return Err(engine_error!(
                    AlreadySubmitted,
                    "{name} already submitted a guess this round"
                ));
            }
            Ok(())
        })();

        if result.is_ok() {
            self.broadcast(EventPayload::BetPlaced(BetPlacedData {
                player_name: name,
            }));
        }
        let _ = respond.send(result);
    }

    fn on_submit_guess(&mut self, name: String, year: i32, bet: bool, respond: Responder<()>) {
        let result = (|| {
            if !self.state.config.year_in_range(year) {
                return Err(engine_error!(
                    YearOutOfRange,
                    "{year} is outside the configured range"
                ));
            }
            self.state
                .player_by_name(&name)
                .ok_or_else(|| engine_error!(SessionUnknown, "unknown player {name}"))?;
            let round = self
                .state
                .current_round
                .as_mut()
                .filter(|r| r.is_active())
                .ok_or_else(|| engine_error!(NoActiveRound, "no round is currently active"))?;

            round_engine::record_guess(
                round,
                Guess {
                    player_name: name.clone(),
                    year,
                    bet_placed: bet,
                    submitted_at: std::time::Instant::now(),
                },
            )
            .map_err(|rejection| match rejection {
                round_engine::GuessRejection::Late => {
                    engine_error!(LateSubmission, "guess arrived after the round deadline")
                }
                round_engine::GuessRejection::Duplicate => {
                    engine_error!(AlreadySubmitted, "{name} already submitted this round")
                }
                round_engine::GuessRejection::NotEligible => engine_error!(
                    NoActiveRound,
                    "{name} joined after this round started"
                ),
            })
        })();

        if result.is_ok() {
            self.broadcast(EventPayload::GuessSubmitted(GuessSubmittedData {
                player_name: name,
            }));
            self.maybe_end_round();
        }
        let _ = respond.send(result);
    }

    async fn on_start_game(
        &mut self,
        overrides: protocol::GameConfigOverrides,
        admin_secret: Option<String>,
        is_admin_channel: bool,
        requesting_connection: Option<crate::broadcast_hub::ConnectionId>,
        respond: Responder<StartGameOutcome>,
    ) {
        // Before the first `start_game`, no secret has been minted yet, so
        // `authorize_admin` only accepts the admin-flagged channel itself
        // — which is exactly what bootstraps the very first admin.
        if !self.authorized(&admin_secret, is_admin_channel) {
            let _ = respond.send(Err(engine_error!(NotAdmin, "not authorized to start the game")));
            return;
        }

        let result = self.try_start_game(overrides).await;
        if let Ok(outcome) = &result {
            // `game_reset` fires exactly once per client: the connection
            // that issued `start_game` (if it came in over the WebSocket)
            // gets its own copy carrying the freshly minted admin secret
            // and is excluded from the public broadcast; everyone else
            // just gets the public, secret-less version.
            match requesting_connection {
                Some(connection_id) => {
                    self.hub.broadcast_except(
                        connection_id,
                        EventEnvelope::new(EventPayload::GameReset(GameResetData {
                            admin_secret: None,
                        })),
                    );
                    self.hub.send_to(
                        connection_id,
                        EventEnvelope::new(EventPayload::GameReset(GameResetData {
                            admin_secret: Some(outcome.admin_secret.clone()),
                        })),
                    );
                }
                None => {
                    self.broadcast(EventPayload::GameReset(GameResetData { admin_secret: None }));
                }
            }
        }
        let _ = respond.send(result);
    }

    async fn try_start_game(
        &mut self,
        overrides: protocol::GameConfigOverrides,
    ) -> Result<StartGameOutcome, EngineError> {
        let new_config = self.state.config.apply_overrides(&overrides)?;

        let loaded = self.playback.load_playlist(&new_config.playlist_id).await?;
        if loaded.skipped_count > 0 {
            tracing::warn!(
                skipped = loaded.skipped_count,
                "songs without a year were dropped from the playlist"
            );
        }
        let songs: Vec<_> = loaded
            .songs
            .into_iter()
            .filter(|s| new_config.year_in_range(s.year))
            .collect();
        if songs.is_empty() {
            return Err(engine_error!(
                PlaylistEmpty,
                "playlist has no songs within the configured year range"
            ));
        }

        let snapshot = match tokio::time::timeout(
            PLAYBACK_CALL_TIMEOUT,
            self.playback.snapshot_state(&new_config.playback_target_id),
        )
        .await
        {
            Ok(Ok(token)) => Some(token),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "snapshot_state failed, playback restore on stop_game will be skipped");
                None
            }
            Err(_) => {
                tracing::warn!("snapshot_state timed out, playback restore on stop_game will be skipped");
                None
            }
        };

        let admin_secret = random_hex_token();
        self.state.config = new_config;
        self.state.admin_secret = Some(admin_secret.clone());
        self.state.playback_snapshot = snapshot;
        // `start_game` always lands back in `lobby`, freshly reset; the
        // first `next_song` is what moves the game to `active`.
        self.state.status = GameStatus::Lobby;
        self.state.round_counter = 0;
        round_engine::reset_pool(&mut self.state, songs);
        self.state.current_round = None;
        // Spec §3/§4.1: `start_game` clears Players along with the played
        // set and current round — a fresh game starts from an empty lobby,
        // not a carried-over roster.
        self.state.players.clear();

        Ok(StartGameOutcome { admin_secret })
    }

    async fn on_next_song(
        &mut self,
        admin_secret: Option<String>,
        is_admin_channel: bool,
        respond: Responder<()>,
    ) {
        if !self.authorized(&admin_secret, is_admin_channel) {
            let _ = respond.send(Err(engine_error!(NotAdmin, "not authorized to advance the round")));
            return;
        }
        // Valid from `lobby` (either freshly started, or between rounds
        // after the previous one ended and returned here).
        if self.state.status != GameStatus::Lobby {
            let _ = respond.send(Err(engine_error!(
                GameEnded,
                "next_song is only valid between rounds"
            )));
            return;
        }
        let outcome = self.arm_next_round().await;
        let _ = respond.send(outcome);
    }

    async fn on_stop_game(
        &mut self,
        admin_secret: Option<String>,
        is_admin_channel: bool,
        respond: Responder<()>,
    ) {
        if !self.authorized(&admin_secret, is_admin_channel) {
            let _ = respond.send(Err(engine_error!(NotAdmin, "not authorized to stop the game")));
            return;
        }
        if let Some(token) = self.state.playback_snapshot.take() {
            let target_id = self.state.config.playback_target_id.clone();
            match tokio::time::timeout(PLAYBACK_CALL_TIMEOUT, self.playback.restore_state(&target_id, token)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!(error = %err, "restore_state failed"),
                Err(_) => tracing::warn!("restore_state timed out"),
            }
        }
        self.state.status = GameStatus::Ended;
        self.state.current_round = None;
        self.broadcast(EventPayload::GameReset(GameResetData { admin_secret: None }));
        let _ = respond.send(Ok(()));
    }

    fn on_deadline_expired(&mut self, round_number: u32) {
        let is_current = self
            .state
            .current_round
            .as_ref()
            .map(|r| r.number == round_number && r.is_active())
            .unwrap_or(false);
        if !is_current {
            return;
        }
        if let Some(round) = self.state.current_round.take() {
            self.end_round(round);
        }
    }

    /// Called after every guess; ends the round immediately once every
    /// eligible player has submitted, instead of waiting for the timer.
    fn maybe_end_round(&mut self) {
        let should_end = self
            .state
            .current_round
            .as_ref()
            .map(round_engine::should_end_round)
            .unwrap_or(false);
        if should_end {
            if let Some(round) = self.state.current_round.take() {
                self.end_round(round);
            }
        }
    }

    fn end_round(&mut self, mut round: crate::state::Round) {
        let payload =
            round_engine::finalize_round(&self.state.config, &mut round, &mut self.state.players);
        self.broadcast(EventPayload::RoundEnded(payload));
        // Round end always returns the game to `lobby`, ready for the
        // next `next_song` (or `stop_game`).
        self.state.status = GameStatus::Lobby;
    }

    /// Draws the next song, asks the Playback Adapter to play it, and arms
    /// a new round, moving the game to `active`. A `play` failure (error or
    /// 2s timeout) is retried with a freshly drawn song up to
    /// `PLAY_RETRY_ATTEMPTS` times before surfacing `playback_failed` to
    /// the admin; running out of songs at any point surfaces
    /// `pool_exhausted` instead. Neither failure has any visible side
    /// effect on clients — `round_started` is only broadcast once a song
    /// is actually playing.
    async fn arm_next_round(&mut self) -> Result<(), EngineError> {
        let target_id = self.state.config.playback_target_id.clone();
        let mut song = None;
        let mut last_err = None;
        for attempt in 1..=PLAY_RETRY_ATTEMPTS {
            let Some(candidate) = round_engine::pick_song(
                &mut self.state.available_songs,
                &mut self.state.played_song_ids,
            ) else {
                return Err(engine_error!(PoolExhausted, "no songs remain in the pool"));
            };
            match tokio::time::timeout(PLAYBACK_CALL_TIMEOUT, self.playback.play(&target_id, &candidate.id))
                .await
            {
                Ok(Ok(())) => {
                    song = Some(candidate);
                    break;
                }
                Ok(Err(err)) => {
                    tracing::warn!(attempt, song = candidate.id, error = %err, "play failed, retrying with another song");
                    last_err = Some(err);
                }
                Err(_) => {
                    tracing::warn!(attempt, song = candidate.id, "play timed out, retrying with another song");
                    last_err = Some(engine_error!(PlaybackFailed, "play timed out after {PLAYBACK_CALL_TIMEOUT:?}"));
                }
            }
        }
        let Some(mut song) = song else {
            let detail = last_err.map(|e| e.message).unwrap_or_default();
            return Err(engine_error!(
                PlaybackFailed,
                "pool exhausted or broken after {PLAY_RETRY_ATTEMPTS} play attempts: {detail}"
            ));
        };

        if song.cover_reference.is_none() {
            match tokio::time::timeout(PLAYBACK_CALL_TIMEOUT, self.playback.current_metadata(&target_id)).await {
                Ok(Ok(meta)) => song.cover_reference = meta.cover_reference,
                Ok(Err(err)) => tracing::warn!(error = %err, "current_metadata failed, leaving cover art unset"),
                Err(_) => tracing::warn!("current_metadata timed out, leaving cover art unset"),
            }
        }

        self.state.status = GameStatus::Active;
        self.state.round_counter += 1;
        let eligible: HashSet<String> = self
            .state
            .players
            .iter()
            .filter(|p| p.connected)
            .map(|p| p.name.clone())
            .collect();
        let round_number = self.state.round_counter;
        let timer_duration_secs = self.state.config.timer_duration_secs;
        let round = round_engine::arm_round(round_number, song, timer_duration_secs, eligible);

        self.broadcast(EventPayload::RoundStarted(RoundStartedData {
            round_number,
            song: round.song.summary(),
            timer_duration_secs,
            started_at: round.started_at_wall,
        }));

        let deadline = TokioInstant::from_std(round.deadline);
        let sender = self.self_sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = sender.send(Command::DeadlineExpired { round_number }).await;
        });

        self.state.current_round = Some(round);
        Ok(())
    }
}

fn random_hex_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::NullPlaybackAdapter;
    use crate::state::Song;
    use std::time::Duration;

    fn song(id: &str, year: i32) -> Song {
        Song {
            id: id.into(),
            title: format!("song-{id}"),
            artist: "artist".into(),
            year,
            cover_reference: None,
        }
    }

    fn test_coordinator() -> (GameCoordinator, GameCoordinatorHandle) {
        let mut config = GameConfig::default();
        config.timer_duration_secs = 10;
        config.playlist_id = "p1".into();
        let adapter = NullPlaybackAdapter::new()
            .with_playlist("p1", vec![song("s1", 1999), song("s2", 2001)]);
        GameCoordinator::new(config, Arc::new(BroadcastHub::new()), Arc::new(adapter))
    }

    #[tokio::test]
    async fn join_then_start_then_guess_awards_points() {
        let (coordinator, handle) = test_coordinator();
        tokio::spawn(coordinator.run());

        // `start_game` clears the roster, so players join the fresh lobby
        // it leaves behind rather than surviving across the reset.
        let start = handle
            .start_game(protocol::GameConfigOverrides::default(), None, true, None)
            .await
            .unwrap();
        assert_eq!(start.admin_secret.len(), 32);

        let join = handle.join_game("Sarah".into(), false).await.unwrap();
        assert_eq!(join.resolved_name, "Sarah");

        handle.next_song(None, true).await.unwrap();

        handle
            .submit_guess("Sarah".into(), 1999, false)
            .await
            .unwrap();
        // Round should have ended immediately since Sarah was the only
        // eligible player; give the actor a tick to process it.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn duplicate_name_gets_suffixed() {
        let (coordinator, handle) = test_coordinator();
        tokio::spawn(coordinator.run());

        let first = handle.join_game("Sarah".into(), false).await.unwrap();
        let second = handle.join_game("Sarah".into(), false).await.unwrap();
        assert_eq!(first.resolved_name, "Sarah");
        assert_eq!(second.resolved_name, "Sarah (2)");
    }

    #[tokio::test]
    async fn guessing_before_game_start_is_rejected() {
        let (coordinator, handle) = test_coordinator();
        tokio::spawn(coordinator.run());

        handle.join_game("Sarah".into(), false).await.unwrap();
        let result = handle.submit_guess("Sarah".into(), 1999, false).await;
        assert_eq!(result.unwrap_err().code, protocol::ErrorCode::NoActiveRound);
    }

    #[tokio::test]
    async fn non_admin_cannot_start_game() {
        let (coordinator, handle) = test_coordinator();
        tokio::spawn(coordinator.run());

        let result = handle
            .start_game(protocol::GameConfigOverrides::default(), None, false, None)
            .await;
        assert_eq!(result.unwrap_err().code, protocol::ErrorCode::NotAdmin);
    }

    #[tokio::test]
    async fn reconnect_with_unknown_session_fails() {
        let (coordinator, handle) = test_coordinator();
        tokio::spawn(coordinator.run());

        let result = handle.reconnect("not-a-real-session".into()).await;
        assert_eq!(result.unwrap_err().code, protocol::ErrorCode::SessionUnknown);
    }

    #[tokio::test]
    async fn mid_round_joiner_is_excluded_from_the_active_round() {
        let (coordinator, handle) = test_coordinator();
        tokio::spawn(coordinator.run());

        handle
            .start_game(protocol::GameConfigOverrides::default(), None, true, None)
            .await
            .unwrap();
        handle.join_game("Sarah".into(), false).await.unwrap();
        handle.next_song(None, true).await.unwrap();
        handle.join_game("LateJoiner".into(), false).await.unwrap();

        let result = handle
            .submit_guess("LateJoiner".into(), 1999, false)
            .await;
        assert_eq!(result.unwrap_err().code, protocol::ErrorCode::NoActiveRound);
    }
}
