pub mod messages;
pub mod requests;

pub use messages::{ClientMessage, MoveRequest, ServerMessage};
pub use requests::SessionRequest;
