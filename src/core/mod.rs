pub mod board;
pub mod constants;
pub mod player;
pub mod room;
pub mod room_manager;
pub mod round;
pub mod winner;

pub use board::{Board, BoardSize, Cell};
pub use constants::*;
pub use player::{Connection, ConnectionId, Outbound, Player, PlayerProfile, PublicPlayer};
pub use room::{ClaimOutcome, JoinOutcome, Room, RoomSnapshot, RoomStatus};
pub use room_manager::{collect_stats, RoomManager};
pub use round::{Round, RoundConfig, RoundPhase};
pub use winner::{select_winner, select_winner_with, RoundOutcome};
