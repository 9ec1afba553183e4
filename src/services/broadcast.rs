use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

use crate::core::{Board, Player, Round, RoundOutcome};
use crate::error::DeliveryFailure;
use crate::models::ServerMessage;

/// Serialize a message once so every recipient shares the same buffer
///
/// # Returns
///
/// The JSON text, or None if serialization failed (logged)
pub fn encode(message: &ServerMessage<'_>) -> Option<Arc<str>> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Arc::from(text)),
        Err(err) => {
            tracing::error!("Failed to encode outbound message: {}", err);
            None
        }
    }
}

/// Build the periodic state event
///
/// # Arguments
///
/// * `board` - Board to publish
/// * `round` - Current round, for the countdown
/// * `players` - Roster; only public fields are sent
/// * `now` - Clock reading used for `timeLeft`
pub fn board_update(
    board: &Board,
    round: &Round,
    players: &HashMap<String, Player>,
    now: Instant,
) -> Option<Arc<str>> {
    let mut roster: Vec<&Player> = players.values().collect();
    roster.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));

    encode(&ServerMessage::BoardUpdate {
        board: board.cells(),
        time_left: round.seconds_left(now),
        players: roster.into_iter().map(Player::public).collect(),
    })
}

/// Build the terminal round-result event
pub fn round_result(outcome: &RoundOutcome) -> Option<Arc<str>> {
    encode(&ServerMessage::Winner {
        winner: outcome.winner.as_deref(),
        winning_cell: Some(outcome.winning_cell),
    })
}

/// Build the greeting sent to a freshly joined connection
pub fn player_info(player: &Player) -> Option<Arc<str>> {
    encode(&ServerMessage::PlayerInfo {
        id: &player.id,
        profile_image: &player.profile_image,
    })
}

/// Build the notice sent to a connection replaced by a newer one
pub fn superseded() -> Option<Arc<str>> {
    encode(&ServerMessage::LoggedInElsewhere {})
}

/// Queue a message for one player
///
/// # Errors
///
/// Returns the delivery failure after logging it
pub fn deliver(player: &Player, message: Arc<str>) -> Result<(), DeliveryFailure> {
    player.connection.send(message).map_err(|err| {
        tracing::warn!("Delivery to player={} failed: {}", player.id, err);
        err
    })
}

/// Queue a board update for one player, coalescing with an unwritten one
///
/// # Errors
///
/// Returns the delivery failure after logging it
pub fn deliver_board(player: &Player, board: Arc<str>) -> Result<(), DeliveryFailure> {
    player.connection.send_board(board).map_err(|err| {
        tracing::warn!("Board delivery to player={} failed: {}", player.id, err);
        err
    })
}

/// Queue an event for every player in the roster
///
/// Players whose queue is closed or full are removed from the roster so
/// they never see a later event without the earlier ones. Nobody else is
/// affected by a failed delivery.
///
/// # Returns
///
/// IDs of the players that were evicted
pub fn fan_out(players: &mut HashMap<String, Player>, message: &Arc<str>) -> Vec<String> {
    evict_failed(players, |player| deliver(player, Arc::clone(message)))
}

/// Queue a board update for every player in the roster
///
/// Same eviction rule as [`fan_out`].
pub fn fan_out_board(players: &mut HashMap<String, Player>, board: &Arc<str>) -> Vec<String> {
    evict_failed(players, |player| deliver_board(player, Arc::clone(board)))
}

fn evict_failed<F>(players: &mut HashMap<String, Player>, mut send: F) -> Vec<String>
where
    F: FnMut(&Player) -> Result<(), DeliveryFailure>,
{
    let failed: Vec<String> = players
        .values()
        .filter(|player| send(player).is_err())
        .map(|player| player.id.clone())
        .collect();

    for player_id in &failed {
        players.remove(player_id);
        tracing::info!("Evicted player={} after failed delivery", player_id);
    }

    failed
}
