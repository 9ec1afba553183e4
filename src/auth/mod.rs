pub mod middleware;
pub mod token;

pub use middleware::{AuthenticatedPlayer, SESSION_COOKIE};
pub use token::{generate_session_token, verify_session_token, SessionClaims, TokenError};
