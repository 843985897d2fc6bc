//! Proximity scoring and leaderboard ranking (C3).

use crate::config::GameConfig;
use crate::state::{Guess, Player};
use protocol::LeaderboardEntry;

/// `delta = |guess.year - song.year|`. Exact = 0, close = 1-2, near =
/// 3-5, miss = 6+. A bet only ever multiplies a positive base score.
pub fn score_guess(config: &GameConfig, correct_year: i32, guess: &Guess) -> i64 {
    let delta = (guess.year - correct_year).abs();
    let base = if delta == 0 {
        config.exact_points
    } else if delta <= 2 {
        config.close_points
    } else if delta <= 5 {
        config.near_points
    } else {
        0
    };

    if guess.bet_placed && base > 0 {
        base * config.bet_multiplier
    } else {
        base
    }
}

/// Stable ranking by `total_points` descending; ties at the same rank,
/// ordered alphabetically within a tie.
pub fn leaderboard(players: &[Player]) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut entries = Vec::with_capacity(sorted.len());
    let mut rank = 0u32;
    let mut previous_points: Option<i64> = None;
    for (index, player) in sorted.into_iter().enumerate() {
        if previous_points != Some(player.total_points) {
            rank = index as u32 + 1;
            previous_points = Some(player.total_points);
        }
        entries.push(LeaderboardEntry {
            player_name: player.name.clone(),
            total_points: player.total_points,
            rank,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn guess(year: i32, bet: bool) -> Guess {
        Guess {
            player_name: "p".into(),
            year,
            bet_placed: bet,
            submitted_at: Instant::now(),
        }
    }

    fn player(name: &str, points: i64) -> Player {
        Player {
            name: name.into(),
            session_id: format!("sess-{name}"),
            total_points: points,
            is_admin: false,
            connected: true,
        }
    }

    fn scoring_config() -> GameConfig {
        GameConfig {
            exact_points: 10,
            close_points: 5,
            near_points: 2,
            bet_multiplier: 2,
            ..GameConfig::default()
        }
    }

    #[test]
    fn exact_guess_with_bet_doubles() {
        let config = scoring_config();
        assert_eq!(score_guess(&config, 1986, &guess(1986, true)), 20);
    }

    #[test]
    fn near_miss_without_bet() {
        let config = scoring_config();
        assert_eq!(score_guess(&config, 1986, &guess(1981, false)), 2);
    }

    #[test]
    fn boundary_deltas() {
        let config = scoring_config();
        assert_eq!(score_guess(&config, 2000, &guess(2002, false)), 5); // delta=2 close
        assert_eq!(score_guess(&config, 2000, &guess(2003, false)), 2); // delta=3 near
        assert_eq!(score_guess(&config, 2000, &guess(2005, false)), 2); // delta=5 near
        assert_eq!(score_guess(&config, 2000, &guess(2006, false)), 0); // delta=6 miss
    }

    #[test]
    fn bet_on_a_miss_earns_nothing_not_a_penalty() {
        let config = scoring_config();
        assert_eq!(score_guess(&config, 2000, &guess(2010, true)), 0);
    }

    #[test]
    fn leaderboard_breaks_ties_alphabetically() {
        let players = vec![player("Zack", 10), player("Amy", 10), player("Ben", 20)];
        let board = leaderboard(&players);
        assert_eq!(board[0].player_name, "Ben");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].player_name, "Amy");
        assert_eq!(board[1].rank, 2);
        assert_eq!(board[2].player_name, "Zack");
        assert_eq!(board[2].rank, 2);
    }
}
