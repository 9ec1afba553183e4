use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::Board;

/// Result of a round's arbitration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    /// Owner of the elected cell, None when nobody claimed anything
    pub winner: Option<String>,
    /// Index of the elected cell
    pub winning_cell: usize,
}

/// Elect a winning cell using the operating system's CSPRNG
///
/// # Arguments
///
/// * `board` - The final board of the round
///
/// # Returns
///
/// The owner of a uniformly chosen owned cell, or no winner and a uniformly
/// chosen cell over the whole board when nothing was claimed
pub fn select_winner(board: &Board) -> RoundOutcome {
    select_winner_with(board, &mut OsRng)
}

/// Elect a winning cell with the given random source
///
/// Sampling goes through `gen_range`, which rejects out-of-zone draws
/// instead of reducing a narrow value modulo the range.
pub fn select_winner_with<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> RoundOutcome {
    let owned = board.owned_indices();

    if let Some(&winning_cell) = owned.choose(rng) {
        let winner = board
            .cell(winning_cell)
            .and_then(|cell| cell.owner())
            .map(str::to_string);
        return RoundOutcome {
            winner,
            winning_cell,
        };
    }

    RoundOutcome {
        winner: None,
        winning_cell: rng.gen_range(0..board.len()),
    }
}
