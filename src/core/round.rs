use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use super::RoundOutcome;

/// Phase of the round state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    Idle,
    Running,
    Ended,
}

/// Timing of the round lifecycle
#[derive(Debug, Clone)]
pub struct RoundConfig {
    /// Hard length of a round
    pub duration: Duration,
    /// Pause between the result and the next round
    pub cooldown: Duration,
    /// Period of the board broadcast while running
    pub tick_interval: Duration,
    /// Per-connection outbound queue capacity
    pub outbound_queue: usize,
    /// Start the next round even when nobody is connected
    pub restart_when_empty: bool,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(super::ROUND_DURATION_SECONDS),
            cooldown: Duration::from_secs(super::COOLDOWN_SECONDS),
            tick_interval: Duration::from_millis(super::TICK_INTERVAL_MILLIS),
            outbound_queue: super::OUTBOUND_QUEUE_CAPACITY,
            restart_when_empty: false,
        }
    }
}

/// One timed play cycle
///
/// `id` increases on every start so scheduled work can tell whether the
/// round it was armed for is still the current one.
#[derive(Debug, Clone)]
pub struct Round {
    pub id: u64,
    pub phase: RoundPhase,
    pub started_at: Option<Instant>,
    pub ends_at: Option<Instant>,
    pub ended_at: Option<Instant>,
    pub outcome: Option<RoundOutcome>,
}

impl Round {
    pub fn new() -> Self {
        Self {
            id: 0,
            phase: RoundPhase::Idle,
            started_at: None,
            ends_at: None,
            ended_at: None,
            outcome: None,
        }
    }

    /// Enter `Running` from `Idle` or `Ended`
    ///
    /// # Returns
    ///
    /// The new round id, or None if a round is already running
    pub fn begin(&mut self, now: Instant, duration: Duration) -> Option<u64> {
        if self.phase == RoundPhase::Running {
            return None;
        }

        self.id += 1;
        self.phase = RoundPhase::Running;
        self.started_at = Some(now);
        self.ends_at = Some(now + duration);
        self.ended_at = None;
        self.outcome = None;
        Some(self.id)
    }

    /// Enter `Ended` from `Running`
    ///
    /// # Returns
    ///
    /// True for the caller that performed the transition. Every later caller
    /// for the same round gets false and must skip end-of-round work.
    pub fn finish(&mut self, now: Instant) -> bool {
        if self.phase != RoundPhase::Running {
            return false;
        }

        self.phase = RoundPhase::Ended;
        self.ended_at = Some(now);
        true
    }

    /// Return to `Idle` after a cooldown with nobody around
    pub fn park(&mut self) {
        if self.phase == RoundPhase::Ended {
            self.phase = RoundPhase::Idle;
        }
    }

    /// Whether `round_id` is the round currently running
    pub fn is_running(&self, round_id: u64) -> bool {
        self.phase == RoundPhase::Running && self.id == round_id
    }

    /// Whether `round_id` is the round that just ended
    pub fn has_ended(&self, round_id: u64) -> bool {
        self.phase == RoundPhase::Ended && self.id == round_id
    }

    /// Whole seconds left before the deadline, floored and never negative
    pub fn seconds_left(&self, now: Instant) -> u64 {
        match (self.phase, self.ends_at) {
            (RoundPhase::Running, Some(ends_at)) => {
                ends_at.saturating_duration_since(now).as_secs()
            }
            _ => 0,
        }
    }

    /// Whether a running round has reached its deadline at `now`
    ///
    /// Unlike `seconds_left`, which floors, this is false for the whole
    /// last second of the round.
    pub fn deadline_passed(&self, now: Instant) -> bool {
        match (self.phase, self.ends_at) {
            (RoundPhase::Running, Some(ends_at)) => now >= ends_at,
            _ => false,
        }
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_new_round_is_idle() {
        let round = Round::new();

        assert_eq!(round.phase, RoundPhase::Idle);
        assert_eq!(round.id, 0);
        assert_eq!(round.seconds_left(Instant::now()), 0);
    }

    #[test]
    fn test_begin_sets_deadline() {
        let mut round = Round::new();
        let now = Instant::now();

        let id = round.begin(now, MINUTE);

        assert_eq!(id, Some(1));
        assert_eq!(round.phase, RoundPhase::Running);
        assert_eq!(round.ends_at, Some(now + MINUTE));
        assert_eq!(round.seconds_left(now), 60);
    }

    #[test]
    fn test_begin_while_running_is_rejected() {
        let mut round = Round::new();
        let now = Instant::now();
        round.begin(now, MINUTE);

        assert_eq!(round.begin(now, MINUTE), None);
        assert_eq!(round.id, 1);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut round = Round::new();
        let now = Instant::now();
        round.begin(now, MINUTE);

        assert!(round.finish(now));
        assert!(!round.finish(now));
        assert_eq!(round.phase, RoundPhase::Ended);
    }

    #[test]
    fn test_finish_requires_running() {
        let mut round = Round::new();

        assert!(!round.finish(Instant::now()));
        assert_eq!(round.phase, RoundPhase::Idle);
    }

    #[test]
    fn test_seconds_left_floors() {
        let mut round = Round::new();
        let now = Instant::now();
        round.begin(now, MINUTE);

        assert_eq!(round.seconds_left(now + Duration::from_millis(500)), 59);
        assert_eq!(round.seconds_left(now + Duration::from_millis(59_999)), 0);
        assert_eq!(round.seconds_left(now + Duration::from_secs(90)), 0);
    }

    #[test]
    fn test_last_second_is_not_past_deadline() {
        let mut round = Round::new();
        let now = Instant::now();
        round.begin(now, MINUTE);

        let almost = now + Duration::from_millis(59_001);
        assert_eq!(round.seconds_left(almost), 0);
        assert!(!round.deadline_passed(almost));
        assert!(round.deadline_passed(now + MINUTE));

        round.finish(now + MINUTE);
        assert!(!round.deadline_passed(now + MINUTE));
    }

    #[test]
    fn test_round_ids_track_restarts() {
        let mut round = Round::new();
        let now = Instant::now();

        let first = round.begin(now, MINUTE).unwrap();
        round.finish(now);
        assert!(round.has_ended(first));

        let second = round.begin(now, MINUTE).unwrap();
        assert_ne!(first, second);
        assert!(round.is_running(second));
        assert!(!round.is_running(first));
    }

    #[test]
    fn test_park_only_from_ended() {
        let mut round = Round::new();
        let now = Instant::now();
        round.begin(now, MINUTE);

        round.park();
        assert_eq!(round.phase, RoundPhase::Running);

        round.finish(now);
        round.park();
        assert_eq!(round.phase, RoundPhase::Idle);
    }
}
