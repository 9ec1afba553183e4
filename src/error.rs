use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// Errors surfaced by HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing or invalid session")]
    Unauthorized,

    #[error("Unknown board size: {0}")]
    UnknownBoardSize(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::UnknownBoardSize(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(detail) = &self {
            tracing::error!("Request failed: {}", detail);
        }
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        let mut response = (self.status(), body).into_response();
        if let AppError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, retry_after_secs.into());
        }
        response
    }
}

/// Why a move was dropped
///
/// Moves are never answered with an error; the variant is only logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMove {
    #[error("round is not running")]
    RoundNotRunning,

    #[error("cell {index} is outside a board of {cells} cells")]
    OutOfRange { index: usize, cells: usize },

    #[error("cell {0} is already taken")]
    CellTaken(usize),

    #[error("move names a different player than the connection")]
    ForeignPlayer,
}

/// Failure to hand a message to one connection's outbound queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryFailure {
    #[error("connection closed")]
    Closed,

    #[error("connection is not draining its queue")]
    Lagging,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::UnknownBoardSize("8x8".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("bad".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_rate_limited_response_carries_retry_after() {
        let response = AppError::RateLimited {
            retry_after_secs: 7,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
    }

    #[test]
    fn test_invalid_move_messages() {
        let err = InvalidMove::OutOfRange {
            index: 20,
            cells: 16,
        };
        assert_eq!(err.to_string(), "cell 20 is outside a board of 16 cells");
        assert_eq!(
            InvalidMove::CellTaken(3).to_string(),
            "cell 3 is already taken"
        );
    }
}
