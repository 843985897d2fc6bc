//! Token-bucket rate limiting for inbound commands, one bucket per
//! connection per command kind.

use std::time::{Duration, Instant};

/// A rate limiter with a fixed refill rate and burst allowance.
pub struct RateLimiter {
    rate_limit: Duration,
    burst: u32,
    until: Instant,
    burst_used: u32,
}

impl RateLimiter {
    pub fn new(rate_limit: Duration, burst: u32) -> Self {
        Self {
            rate_limit,
            burst,
            until: Instant::now(),
            burst_used: 0,
        }
    }

    /// Returns true if the action exceeds the configured rate and should
    /// be rejected.
    pub fn should_limit_rate(&mut self) -> bool {
        self.should_limit_rate_with_now(Instant::now())
    }

    pub fn should_limit_rate_with_now(&mut self, now: Instant) -> bool {
        if now >= self.until {
            self.until = now + self.rate_limit;
            self.burst_used = 1;
            return false;
        }
        if self.burst_used < self.burst {
            self.burst_used += 1;
            return false;
        }
        true
    }
}

/// Per-connection limiters for every rate-limited command kind, sized per
/// the spec's table: `join_game` 1/5s, `place_bet` 1/s (debounced),
/// `submit_guess` 1/round (modeled as 1/5s burst-1, since the Round
/// Engine is the real enforcer of "once per round"), everything else a
/// 5/s burst.
pub struct ConnectionRateLimiters {
    pub join_game: RateLimiter,
    pub place_bet: RateLimiter,
    pub submit_guess: RateLimiter,
    pub default: RateLimiter,
}

impl Default for ConnectionRateLimiters {
    fn default() -> Self {
        Self {
            join_game: RateLimiter::new(Duration::from_secs(5), 1),
            place_bet: RateLimiter::new(Duration::from_secs(1), 1),
            submit_guess: RateLimiter::new(Duration::from_secs(5), 1),
            default: RateLimiter::new(Duration::from_millis(200), 5),
        }
    }
}

impl ConnectionRateLimiters {
    /// Picks the right bucket for an inbound command and checks it.
    pub fn should_limit(&mut self, command: &protocol::ClientCommand) -> bool {
        use protocol::ClientCommand::*;
        match command {
            JoinGame { .. } => self.join_game.should_limit_rate(),
            PlaceBet { .. } => self.place_bet.should_limit_rate(),
            SubmitGuess { .. } => self.submit_guess.should_limit_rate(),
            Reconnect { .. } | StartGame { .. } | NextSong { .. } | StopGame { .. } => {
                self.default.should_limit_rate()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_then_limited() {
        let mut limiter = RateLimiter::new(Duration::from_millis(10), 3);
        assert!(!limiter.should_limit_rate());
        assert!(!limiter.should_limit_rate());
        assert!(!limiter.should_limit_rate());
        assert!(limiter.should_limit_rate());
    }

    #[test]
    fn refills_after_window() {
        let mut limiter = RateLimiter::new(Duration::from_millis(10), 1);
        let t0 = Instant::now();
        assert!(!limiter.should_limit_rate_with_now(t0));
        assert!(limiter.should_limit_rate_with_now(t0));
        assert!(!limiter.should_limit_rate_with_now(t0 + Duration::from_millis(20)));
    }
}
