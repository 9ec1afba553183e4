use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    auth::{generate_session_token, AuthenticatedPlayer, SESSION_COOKIE},
    error::AppError,
    models::SessionRequest,
    state::AppState,
};

/// Open a session for a provider-asserted identity
///
/// Only routed in development; in production the identity provider mints
/// the cookie itself with the shared secret.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `jar` - Cookie jar for setting the session cookie
/// * `request` - Player id and optional picture
///
/// # Returns
///
/// The identity that was stored, with the session cookie set
pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = request.validated().map_err(AppError::BadRequest)?;
    let profile_image = request
        .picture
        .unwrap_or_else(|| state.config.default_avatar.clone());

    let token = generate_session_token(&request.id, &profile_image, &state.secret_key)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(!state.config.environment.is_development())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(24))
        .build();

    tracing::info!("Session opened for player={}", request.id);

    Ok((
        jar.add(cookie),
        Json(serde_json::json!({
            "id": request.id,
            "profileImage": profile_image,
        })),
    ))
}

/// Identity behind the current session cookie
pub async fn current_session(player: AuthenticatedPlayer) -> impl IntoResponse {
    Json(serde_json::json!({
        "id": player.player_id,
        "profileImage": player.profile_image,
        "expiresAt": player.expiry,
    }))
}

/// Drop the session cookie and go back to the root
pub async fn sign_out(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}
