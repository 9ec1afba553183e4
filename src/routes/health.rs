use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::core::{collect_stats, BoardSize};
use crate::state::AppState;

/// Root path - describe the service and its board endpoints
pub async fn root() -> impl IntoResponse {
    let boards: Vec<String> = BoardSize::ALL
        .iter()
        .map(|size| format!("/api/game/board/size/{}", size.label()))
        .collect();

    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "boards": boards,
    }))
}

/// Health check endpoint
///
/// # Returns
///
/// JSON response with status
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// Per-room phase, player count and countdown
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    // Clone the room handles so the registry lock is not held across room locks
    let rooms = state.room_manager.read().await.rooms();
    Json(collect_stats(&rooms).await)
}
