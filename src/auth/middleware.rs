use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;

use super::token::verify_session_token;
use crate::{
    core::PlayerProfile, error::AppError, models::SessionRequest, state::AppState,
};

/// Cookie holding the signed session token
pub const SESSION_COOKIE: &str = "session_token";

/// Authenticated player information extracted from request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPlayer {
    pub player_id: String,
    pub profile_image: String,
    pub expiry: u64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedPlayer
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // CookieJar extraction is infallible
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value());

        let claims = verify_session_token(token, &app_state.secret_key).ok_or_else(|| {
            tracing::debug!("Rejected request without a valid session");
            AppError::Unauthorized
        })?;

        // Tokens minted elsewhere with the shared secret skip login validation
        if let Err(reason) = SessionRequest::validate_id(&claims.player_id) {
            tracing::warn!("Rejected session for unusable player id: {}", reason);
            return Err(AppError::Unauthorized);
        }

        Ok(AuthenticatedPlayer {
            player_id: claims.player_id,
            profile_image: claims.profile_image,
            expiry: claims.expiry,
        })
    }
}

impl AuthenticatedPlayer {
    /// Identity handed to a room on join
    pub fn profile(&self) -> PlayerProfile {
        PlayerProfile {
            id: self.player_id.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::generate_session_token;
    use crate::config::AppConfig;
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;

    fn state() -> AppState {
        AppState::new(AppConfig::for_tests("middleware_secret"))
    }

    async fn extract(cookie: Option<String>) -> Result<AuthenticatedPlayer, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthenticatedPlayer::from_request_parts(&mut parts, &state()).await
    }

    #[tokio::test]
    async fn test_valid_cookie_is_accepted() {
        let token = generate_session_token("alice", "/img/a.png", "middleware_secret").unwrap();

        let player = extract(Some(format!("{}={}", SESSION_COOKIE, token)))
            .await
            .unwrap();

        assert_eq!(player.player_id, "alice");
        assert_eq!(player.profile().profile_image, "/img/a.png");
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthorized() {
        let err = extract(None).await.unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reserved_player_id_is_unauthorized() {
        let token = generate_session_token("winner", "/img/a.png", "middleware_secret").unwrap();

        let result = extract(Some(format!("{}={}", SESSION_COOKIE, token))).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_foreign_signature_is_unauthorized() {
        let token = generate_session_token("alice", "/img/a.png", "other_secret").unwrap();

        let result = extract(Some(format!("{}={}", SESSION_COOKIE, token))).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
