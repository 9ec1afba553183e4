use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::error::DeliveryFailure;

/// Identifier of one live socket, distinct across reconnects
pub type ConnectionId = Uuid;

/// Board text waiting in a queue; newer boards overwrite it until written
type BoardSlot = Arc<Mutex<Option<Arc<str>>>>;

/// One entry of a connection's outbound queue
#[derive(Debug)]
pub enum Outbound {
    /// Delivered exactly as queued
    Event(Arc<str>),
    /// Latest board at the time the writer reaches this entry
    Board(BoardSlot),
}

impl Outbound {
    /// Text to put on the socket, if any is left
    pub fn into_text(self) -> Option<Arc<str>> {
        match self {
            Outbound::Event(text) => Some(text),
            Outbound::Board(slot) => lock(&slot).take(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outbound half of a player's socket
///
/// Messages are pre-serialized JSON shared between all recipients of a
/// broadcast. The writer task on the other end of the queue owns the socket.
///
/// Board updates coalesce: while the newest queued entry is an unwritten
/// board, a later board replaces its text instead of taking another slot.
/// A slow reader therefore holds at most one board between two events,
/// which matters on the largest board where each update is megabytes.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<Outbound>,
    /// Board entry at the tail of the queue, cleared once an event follows it
    open_board: Arc<Mutex<Option<BoardSlot>>>,
}

impl Connection {
    pub fn new(tx: mpsc::Sender<Outbound>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
            open_board: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event without waiting
    ///
    /// # Errors
    ///
    /// `Lagging` when the queue is full, `Closed` when the writer is gone
    pub fn send(&self, message: Arc<str>) -> Result<(), DeliveryFailure> {
        let mut open_board = lock(&self.open_board);
        self.push(Outbound::Event(message))?;
        // Boards after this event must not overwrite the one before it
        *open_board = None;
        Ok(())
    }

    /// Queue a board update, replacing an unwritten board at the tail
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send`]
    pub fn send_board(&self, board: Arc<str>) -> Result<(), DeliveryFailure> {
        let mut open_board = lock(&self.open_board);
        if let Some(slot) = open_board.as_ref() {
            let mut pending = lock(slot);
            if pending.is_some() {
                *pending = Some(board);
                return Ok(());
            }
        }

        let slot: BoardSlot = Arc::new(Mutex::new(Some(board)));
        self.push(Outbound::Board(Arc::clone(&slot)))?;
        *open_board = Some(slot);
        Ok(())
    }

    fn push(&self, entry: Outbound) -> Result<(), DeliveryFailure> {
        self.tx.try_send(entry).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryFailure::Lagging,
            TrySendError::Closed(_) => DeliveryFailure::Closed,
        })
    }
}

/// Identity asserted by the session provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub id: String,
    pub profile_image: String,
}

/// A connected player
#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub profile_image: String,
    pub connection: Connection,
    pub joined_at: OffsetDateTime,
}

impl Player {
    pub fn new(profile: PlayerProfile, connection: Connection) -> Self {
        Self {
            id: profile.id,
            profile_image: profile.profile_image,
            connection,
            joined_at: OffsetDateTime::now_utc(),
        }
    }

    /// Fields safe to show other players
    pub fn public(&self) -> PublicPlayer<'_> {
        PublicPlayer {
            id: &self.id,
            profile_image: &self.profile_image,
        }
    }
}

/// Roster entry as sent on the wire; never carries the connection
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PublicPlayer<'a> {
    pub id: &'a str,
    #[serde(rename = "profileImage")]
    pub profile_image: &'a str,
}
