use std::time::Duration;
use tokio::time::Instant;

use crate::core::{select_winner, Board, Round, RoundOutcome};

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    BoardFull,
    Timeout,
}

/// Start a round: wipe the board and arm the deadline
///
/// # Returns
///
/// The new round id, or None if a round is already running (board untouched)
pub fn begin_round(
    board: &mut Board,
    round: &mut Round,
    now: Instant,
    duration: Duration,
) -> Option<u64> {
    let round_id = round.begin(now, duration)?;
    board.reset();
    Some(round_id)
}

/// End the running round and elect its winner
///
/// Only the first caller per round gets an outcome; the winner selector runs
/// exactly once and the elected cell is marked on the board.
///
/// # Returns
///
/// The outcome for the caller that ended the round, None for everyone else
pub fn conclude_round(board: &mut Board, round: &mut Round, now: Instant) -> Option<RoundOutcome> {
    if !round.finish(now) {
        return None;
    }

    let outcome = select_winner(board);
    board.mark_winner(outcome.winning_cell);
    round.outcome = Some(outcome.clone());
    Some(outcome)
}
