//! C3: song selection and round lifecycle helpers.
//!
//! The deadline timer itself is armed by the Coordinator as a cancellable
//! task that delivers a `deadline_expired` command back onto the command
//! channel (see `coordinator.rs`) — this module only contains the pure,
//! synchronous logic invoked while the Coordinator's serialization
//! boundary is held.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::scoring::{leaderboard, score_guess};
use crate::state::{GameState, Guess, Player, Round, RoundStatus, Song};
use protocol::RoundEndedData;

/// Uniform random draw without replacement; selection and removal from
/// `available` are atomic with insertion into `played` by construction
/// (both updates happen under the Coordinator's single mutation).
pub fn pick_song(
    available: &mut Vec<Song>,
    played: &mut HashSet<String>,
) -> Option<Song> {
    if available.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..available.len());
    let song = available.remove(index);
    played.insert(song.id.clone());
    Some(song)
}

pub fn arm_round(
    number: u32,
    song: Song,
    timer_duration_secs: u32,
    eligible_players: HashSet<String>,
) -> Round {
    let started_at = Instant::now();
    Round {
        number,
        song,
        started_at,
        started_at_wall: chrono::Utc::now(),
        deadline: started_at + Duration::from_secs(timer_duration_secs as u64),
        status: RoundStatus::Active,
        guesses: std::collections::HashMap::new(),
        eligible_players,
    }
}

/// Round ends when every eligible (joined before this round, still
/// connected) player has submitted, or the deadline has already passed.
pub fn should_end_round(round: &Round) -> bool {
    if !round.is_active() {
        return false;
    }
    let now = Instant::now();
    now >= round.deadline || round.guesses.len() >= round.eligible_players.len().max(1)
}

/// Scores every guess in `round`, updates each player's running total in
/// place, marks the round `ended`, and returns the `round_ended` payload.
/// Idempotent in the sense that calling it twice on an already-`ended`
/// round is the caller's bug to avoid — see
/// [`crate::coordinator::GameCoordinator`]'s single-transition guard.
pub fn finalize_round(
    config: &crate::config::GameConfig,
    round: &mut Round,
    players: &mut [Player],
) -> RoundEndedData {
    round.status = RoundStatus::Ended;

    let mut results: Vec<protocol::RoundResultEntry> = Vec::with_capacity(round.guesses.len());
    for guess in round.guesses.values() {
        let earned = score_guess(config, round.song.year, guess);
        if let Some(player) = players.iter_mut().find(|p| p.name == guess.player_name) {
            player.total_points += earned;
        }
        results.push(protocol::RoundResultEntry {
            player_name: guess.player_name.clone(),
            guess: guess.year,
            points_earned: earned,
            bet_placed: guess.bet_placed,
        });
    }
    results.sort_by(|a, b| {
        b.points_earned
            .cmp(&a.points_earned)
            .then_with(|| a.player_name.cmp(&b.player_name))
    });

    RoundEndedData {
        correct_year: round.song.year,
        results,
        leaderboard: leaderboard(players),
    }
}

/// Records a guess, enforcing "at most one guess per player per round",
/// "late guesses are rejected", and "players who joined mid-round have no
/// standing in it". Caller has already checked the round is active.
pub fn record_guess(round: &mut Round, guess: Guess) -> Result<(), GuessRejection> {
    if !round.eligible_players.contains(&guess.player_name) {
        return Err(GuessRejection::NotEligible);
    }
    if guess.submitted_at > round.deadline {
        return Err(GuessRejection::Late);
    }
    if round.guesses.contains_key(&guess.player_name) {
        return Err(GuessRejection::Duplicate);
    }
    round.guesses.insert(guess.player_name.clone(), guess);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessRejection {
    Late,
    Duplicate,
    NotEligible,
}

/// Resets the playable pool back to the full, year-filtered playlist and
/// clears the played set — invariant 6 in the testable-properties list.
pub fn reset_pool(state: &mut GameState, songs: Vec<Song>) {
    state.available_songs = songs;
    state.played_song_ids.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn song(id: &str, year: i32) -> Song {
        Song {
            id: id.into(),
            title: "t".into(),
            artist: "a".into(),
            year,
            cover_reference: None,
        }
    }

    fn player(name: &str) -> Player {
        Player {
            name: name.into(),
            session_id: format!("sess-{name}"),
            total_points: 0,
            is_admin: false,
            connected: true,
        }
    }

    #[test]
    fn pick_song_moves_between_pools_atomically() {
        let mut available = vec![song("a", 2000), song("b", 2001)];
        let mut played = HashSet::new();
        let picked = pick_song(&mut available, &mut played).unwrap();
        assert_eq!(available.len(), 1);
        assert!(played.contains(&picked.id));
        assert!(!available.iter().any(|s| s.id == picked.id));
    }

    #[test]
    fn pick_song_on_empty_pool_returns_none() {
        let mut available = Vec::new();
        let mut played = HashSet::new();
        assert!(pick_song(&mut available, &mut played).is_none());
    }

    fn eligible(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn all_submitted_ends_round_early() {
        let mut round = arm_round(1, song("a", 2000), 30, eligible(&["Sarah"]));
        round
            .guesses
            .insert(
                "Sarah".into(),
                Guess {
                    player_name: "Sarah".into(),
                    year: 2000,
                    bet_placed: false,
                    submitted_at: Instant::now(),
                },
            );
        assert!(should_end_round(&round));
    }

    #[test]
    fn deadline_ends_round_even_without_all_submitted() {
        let mut round = arm_round(1, song("a", 2000), 30, eligible(&["Sarah", "Alex", "Chris", "Dana", "Eli"]));
        round.deadline = Instant::now() - Duration::from_secs(1);
        assert!(should_end_round(&round));
    }

    #[test]
    fn already_ended_round_never_ends_again() {
        let mut round = arm_round(1, song("a", 2000), 30, HashSet::new());
        round.status = RoundStatus::Ended;
        assert!(!should_end_round(&round));
    }

    #[test]
    fn late_guess_is_rejected() {
        let mut round = arm_round(1, song("a", 2000), 30, eligible(&["Chris"]));
        round.deadline = Instant::now() - Duration::from_secs(1);
        let result = record_guess(
            &mut round,
            Guess {
                player_name: "Chris".into(),
                year: 2000,
                bet_placed: false,
                submitted_at: Instant::now(),
            },
        );
        assert_eq!(result.unwrap_err(), GuessRejection::Late);
    }

    #[test]
    fn duplicate_guess_is_rejected() {
        let mut round = arm_round(1, song("a", 2000), 30, eligible(&["Chris"]));
        let make_guess = || Guess {
            player_name: "Chris".into(),
            year: 2000,
            bet_placed: false,
            submitted_at: Instant::now(),
        };
        record_guess(&mut round, make_guess()).unwrap();
        assert_eq!(
            record_guess(&mut round, make_guess()).unwrap_err(),
            GuessRejection::Duplicate
        );
    }

    #[test]
    fn mid_round_joiner_has_no_standing_in_this_round() {
        let mut round = arm_round(1, song("a", 2000), 30, eligible(&["Chris"]));
        let result = record_guess(
            &mut round,
            Guess {
                player_name: "LateJoiner".into(),
                year: 2000,
                bet_placed: false,
                submitted_at: Instant::now(),
            },
        );
        assert_eq!(result.unwrap_err(), GuessRejection::NotEligible);
    }

    #[test]
    fn finalize_round_scores_and_updates_totals_once() {
        let config = GameConfig {
            exact_points: 10,
            close_points: 5,
            near_points: 2,
            bet_multiplier: 2,
            ..GameConfig::default()
        };
        let mut round = arm_round(1, song("a", 1986), 30, eligible(&["Sarah"]));
        record_guess(
            &mut round,
            Guess {
                player_name: "Sarah".into(),
                year: 1986,
                bet_placed: true,
                submitted_at: Instant::now(),
            },
        )
        .unwrap();
        let mut players = vec![player("Sarah")];

        let payload = finalize_round(&config, &mut round, &mut players);

        assert_eq!(payload.correct_year, 1986);
        assert_eq!(payload.results.len(), 1);
        assert_eq!(payload.results[0].points_earned, 20);
        assert_eq!(players[0].total_points, 20);
        assert_eq!(round.status, RoundStatus::Ended);
    }
}
