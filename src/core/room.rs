use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{
    Board, BoardSize, Cell, Connection, ConnectionId, Player, PlayerProfile, Round, RoundConfig,
    RoundOutcome, RoundPhase,
};
use crate::error::InvalidMove;
use crate::models::MoveRequest;
use crate::services::{begin_round, broadcast, conclude_round, EndReason};

/// Effect of an accepted move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The cell is now owned by the mover
    Claimed,
    /// The move filled the board and ended the round
    RoundEnded(RoundOutcome),
}

/// Effect of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// An older connection for the same player was replaced
    pub superseded: bool,
    /// The join started a round in an idle room
    pub started_round: bool,
}

/// Scheduled activities of the current round
#[derive(Debug, Default)]
struct RoundTimers {
    tick: Option<JoinHandle<()>>,
    deadline: Option<JoinHandle<()>>,
    cooldown: Option<JoinHandle<()>>,
}

impl RoundTimers {
    /// Stop the tick and deadline of a round that has ended
    fn cancel_running(&mut self) {
        for handle in [self.tick.take(), self.deadline.take()].into_iter().flatten() {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        self.cancel_running();
        if let Some(handle) = self.cooldown.take() {
            handle.abort();
        }
    }
}

/// Everything a room guards behind its lock
#[derive(Debug)]
pub struct RoomState {
    pub board: Board,
    pub round: Round,
    pub players: HashMap<String, Player>,
    timers: RoundTimers,
}

/// Read-only summary of a room
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub size: BoardSize,
    pub phase: RoundPhase,
    pub round_id: u64,
    pub seconds_left: u64,
    pub board: Vec<Cell>,
    pub player_ids: Vec<String>,
    pub outcome: Option<RoundOutcome>,
}

/// Room summary for the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RoomStatus {
    pub size: String,
    pub phase: RoundPhase,
    pub round_id: u64,
    pub seconds_left: u64,
    pub players: usize,
    pub created_at: i64,
}

/// One independent game for a board size
///
/// All mutation goes through the state lock: joins, leaves, moves and the
/// round's scheduled tick, deadline and cooldown. Scheduled tasks hold a
/// weak reference and re-check the round id and phase after locking, so a
/// task that fires late for a round that has already moved on does nothing.
#[derive(Debug)]
pub struct Room {
    size: BoardSize,
    config: RoundConfig,
    created_at: OffsetDateTime,
    state: Mutex<RoomState>,
}

impl Room {
    pub fn new(size: BoardSize, config: RoundConfig) -> Arc<Self> {
        Arc::new(Self {
            size,
            config,
            created_at: OffsetDateTime::now_utc(),
            state: Mutex::new(RoomState {
                board: Board::new(size),
                round: Round::new(),
                players: HashMap::new(),
                timers: RoundTimers::default(),
            }),
        })
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Add or replace a player's connection
    ///
    /// The new connection receives `playerInfo` followed by a board update.
    /// A previous connection under the same id is told it was superseded and
    /// dropped; cells the player already owns are untouched.
    pub async fn join(self: &Arc<Self>, profile: PlayerProfile, connection: Connection) -> JoinOutcome {
        let mut state = self.state.lock().await;
        let player = Player::new(profile, connection);

        if let Some(message) = broadcast::player_info(&player) {
            let _ = broadcast::deliver(&player, message);
        }

        let player_id = player.id.clone();
        let previous = state.players.insert(player_id.clone(), player);
        let superseded = previous.is_some();
        if let Some(previous) = previous {
            tracing::info!(
                "Player {} reconnected to room {}, superseding connection {}",
                player_id,
                self.size,
                previous.connection.id()
            );
            if let Some(message) = broadcast::superseded() {
                let _ = broadcast::deliver(&previous, message);
            }
        } else {
            tracing::info!(
                "Player {} joined room {} ({} connected)",
                player_id,
                self.size,
                state.players.len()
            );
        }

        let started_round = state.round.phase == RoundPhase::Idle;
        if started_round {
            self.start_round(&mut state);
        } else {
            Self::publish_board(&mut state);
        }

        JoinOutcome {
            superseded,
            started_round,
        }
    }

    /// Remove a player if `connection_id` is still their live connection
    ///
    /// # Returns
    ///
    /// True if the player was removed. A stale connection that was already
    /// superseded, or a player already gone, is a no-op.
    pub async fn leave(&self, player_id: &str, connection_id: ConnectionId) -> bool {
        let mut state = self.state.lock().await;

        let owns_entry = state
            .players
            .get(player_id)
            .is_some_and(|player| player.connection.id() == connection_id);
        if !owns_entry {
            return false;
        }

        state.players.remove(player_id);
        tracing::info!(
            "Player {} left room {} ({} connected)",
            player_id,
            self.size,
            state.players.len()
        );
        Self::publish_board(&mut state);
        true
    }

    /// Apply a claim from an authenticated player
    ///
    /// # Arguments
    ///
    /// * `player_id` - Identity of the connection the move arrived on
    /// * `request` - The decoded move
    ///
    /// # Errors
    ///
    /// Returns why the move was dropped; callers log it and send nothing back
    pub async fn claim(
        self: &Arc<Self>,
        player_id: &str,
        request: &MoveRequest,
    ) -> Result<ClaimOutcome, InvalidMove> {
        if request.player_id != player_id {
            return Err(InvalidMove::ForeignPlayer);
        }

        let mut state = self.state.lock().await;

        if state.round.phase != RoundPhase::Running {
            return Err(InvalidMove::RoundNotRunning);
        }

        let cells = state.board.len();
        if request.index >= cells {
            return Err(InvalidMove::OutOfRange {
                index: request.index,
                cells,
            });
        }

        if !state.board.claim(request.index, player_id) {
            return Err(InvalidMove::CellTaken(request.index));
        }

        if state.board.is_full() {
            return match self.end_round(&mut state, EndReason::BoardFull) {
                Some(outcome) => Ok(ClaimOutcome::RoundEnded(outcome)),
                None => Ok(ClaimOutcome::Claimed),
            };
        }

        if self.size.broadcasts_every_claim() {
            Self::publish_board(&mut state);
        }

        Ok(ClaimOutcome::Claimed)
    }

    /// Consistent copy of the room for inspection
    pub async fn snapshot(&self) -> RoomSnapshot {
        let state = self.state.lock().await;
        let mut player_ids: Vec<String> = state.players.keys().cloned().collect();
        player_ids.sort();

        RoomSnapshot {
            size: self.size,
            phase: state.round.phase,
            round_id: state.round.id,
            seconds_left: state.round.seconds_left(Instant::now()),
            board: state.board.snapshot(),
            player_ids,
            outcome: state.round.outcome.clone(),
        }
    }

    /// Summary without copying the board
    pub async fn status(&self) -> RoomStatus {
        let state = self.state.lock().await;
        RoomStatus {
            size: self.size.label(),
            phase: state.round.phase,
            round_id: state.round.id,
            seconds_left: state.round.seconds_left(Instant::now()),
            players: state.players.len(),
            created_at: self.created_at.unix_timestamp(),
        }
    }

    fn start_round(self: &Arc<Self>, state: &mut RoomState) {
        let now = Instant::now();
        let Some(round_id) = begin_round(
            &mut state.board,
            &mut state.round,
            now,
            self.config.duration,
        ) else {
            return;
        };

        state.timers.cancel_all();
        state.timers.tick = Some(self.spawn_ticker(round_id));
        state.timers.deadline = Some(self.spawn_deadline(round_id, now + self.config.duration));

        tracing::info!(
            "Round {} started in room {} with {} players",
            round_id,
            self.size,
            state.players.len()
        );
        Self::publish_board(state);
    }

    /// Run end-of-round work once; later callers for the same round get None
    fn end_round(self: &Arc<Self>, state: &mut RoomState, reason: EndReason) -> Option<RoundOutcome> {
        let outcome = conclude_round(&mut state.board, &mut state.round, Instant::now())?;
        let round_id = state.round.id;

        state.timers.cancel_running();
        tracing::info!(
            "Round {} ended in room {} ({:?}): winner={:?} cell={}",
            round_id,
            self.size,
            reason,
            outcome.winner,
            outcome.winning_cell
        );

        // Final board first, then the result, on every connection
        Self::publish_board(state);
        if let Some(message) = broadcast::round_result(&outcome) {
            broadcast::fan_out(&mut state.players, &message);
        }

        state.timers.cooldown = Some(self.spawn_cooldown(round_id));
        Some(outcome)
    }

    fn publish_board(state: &mut RoomState) {
        let message = broadcast::board_update(
            &state.board,
            &state.round,
            &state.players,
            Instant::now(),
        );
        if let Some(message) = message {
            broadcast::fan_out_board(&mut state.players, &message);
        }
    }

    fn spawn_ticker(self: &Arc<Self>, round_id: u64) -> JoinHandle<()> {
        let room = Arc::downgrade(self);
        let period = self.config.tick_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(room) = room.upgrade() else {
                    break;
                };
                if !room.on_tick(round_id).await {
                    break;
                }
            }
        })
    }

    fn spawn_deadline(self: &Arc<Self>, round_id: u64, deadline: Instant) -> JoinHandle<()> {
        let room = Arc::downgrade(self);

        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(room) = room.upgrade() {
                room.on_deadline(round_id).await;
            }
        })
    }

    fn spawn_cooldown(self: &Arc<Self>, round_id: u64) -> JoinHandle<()> {
        let room: Weak<Room> = Arc::downgrade(self);
        let cooldown = self.config.cooldown;

        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            if let Some(room) = room.upgrade() {
                room.on_cooldown_elapsed(round_id).await;
            }
        })
    }

    /// Periodic broadcast; returns false once the ticker should stop
    async fn on_tick(self: &Arc<Self>, round_id: u64) -> bool {
        let mut state = self.state.lock().await;
        if !state.round.is_running(round_id) {
            return false;
        }

        // `timeLeft` reads 0 during the last second; only the real
        // deadline ends the round
        if state.round.deadline_passed(Instant::now()) {
            self.end_round(&mut state, EndReason::Timeout);
            return false;
        }

        Self::publish_board(&mut state);
        true
    }

    async fn on_deadline(self: &Arc<Self>, round_id: u64) {
        let mut state = self.state.lock().await;
        if state.round.is_running(round_id) {
            self.end_round(&mut state, EndReason::Timeout);
        }
    }

    async fn on_cooldown_elapsed(self: &Arc<Self>, round_id: u64) {
        let mut state = self.state.lock().await;
        if !state.round.has_ended(round_id) {
            return;
        }

        if state.players.is_empty() && !self.config.restart_when_empty {
            state.round.park();
            tracing::info!("Room {} is idle, nobody connected", self.size);
            return;
        }

        self.start_round(&mut state);
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.state.get_mut().timers.cancel_all();
    }
}
