use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_EXPIRY_SECONDS: u64 = 86400; // 24 hours

/// Identity carried by a verified session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub player_id: String,
    pub profile_image: String,
    pub expiry: u64,
}

/// Failure to mint a session token
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("System time error: {0}")]
    Clock(#[from] std::time::SystemTimeError),

    #[error("HMAC initialization error")]
    Key,
}

fn now_seconds() -> Result<u64, std::time::SystemTimeError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn sign(payload: &str, secret_key: &str) -> Result<HmacSha256, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).map_err(|_| TokenError::Key)?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

/// Generate a signed session token for a provider-asserted identity
///
/// # Arguments
///
/// * `player_id` - Stable id from the identity provider
/// * `profile_image` - Avatar reference to show other players
/// * `secret_key` - Secret key for signing
///
/// # Returns
///
/// Token in format `b64(id):b64(image):expiry.signature`; both fields are
/// base64url so provider ids and URLs cannot collide with the separators
pub fn generate_session_token(
    player_id: &str,
    profile_image: &str,
    secret_key: &str,
) -> Result<String, TokenError> {
    let expiry = now_seconds()? + TOKEN_EXPIRY_SECONDS;
    generate_session_token_expiring(player_id, profile_image, secret_key, expiry)
}

/// Generate a token with an explicit expiry (unix seconds)
pub fn generate_session_token_expiring(
    player_id: &str,
    profile_image: &str,
    secret_key: &str,
    expiry: u64,
) -> Result<String, TokenError> {
    let payload = format!(
        "{}:{}:{}",
        URL_SAFE_NO_PAD.encode(player_id),
        URL_SAFE_NO_PAD.encode(profile_image),
        expiry
    );

    let signature = sign(&payload, secret_key)?.finalize().into_bytes();

    Ok(format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(signature)))
}

/// Verify a session token and extract its identity
///
/// # Returns
///
/// The claims if the signature matches and the token is unexpired, None
/// otherwise. The signature is checked in constant time.
pub fn verify_session_token(token: Option<&str>, secret_key: &str) -> Option<SessionClaims> {
    let (payload, signature_b64) = token?.split_once('.')?;
    if signature_b64.contains('.') {
        return None;
    }

    let mut fields = payload.split(':');
    let (id_b64, image_b64, expiry_str) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() {
        return None;
    }

    let provided_signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
    sign(payload, secret_key)
        .ok()?
        .verify_slice(&provided_signature)
        .ok()?;

    let expiry: u64 = expiry_str.parse().ok()?;
    if now_seconds().ok()? > expiry {
        return None;
    }

    let player_id = String::from_utf8(URL_SAFE_NO_PAD.decode(id_b64).ok()?).ok()?;
    let profile_image = String::from_utf8(URL_SAFE_NO_PAD.decode(image_b64).ok()?).ok()?;
    if player_id.is_empty() {
        return None;
    }

    Some(SessionClaims {
        player_id,
        profile_image,
        expiry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    const SECRET: &str = "test_secret_key_12345";

    #[test]
    fn test_generate_and_verify_valid_token() {
        let token = assert_ok!(generate_session_token("user_123", "/img/a.png", SECRET));
        assert!(token.contains('.'));

        let claims = verify_session_token(Some(&token), SECRET).unwrap();
        assert_eq!(claims.player_id, "user_123");
        assert_eq!(claims.profile_image, "/img/a.png");
    }

    #[test]
    fn test_fields_with_separators_survive() {
        let image = "https://cdn.example.com/a.b:c/pic.png?size=32";
        let token = generate_session_token("id:with.dots", image, SECRET).unwrap();

        let claims = verify_session_token(Some(&token), SECRET).unwrap();
        assert_eq!(claims.player_id, "id:with.dots");
        assert_eq!(claims.profile_image, image);
    }

    #[test]
    fn test_verify_none_token() {
        assert!(verify_session_token(None, SECRET).is_none());
    }

    #[test]
    fn test_verify_token_with_wrong_secret() {
        let token = generate_session_token("alice", "/img/a.png", SECRET).unwrap();

        assert!(verify_session_token(Some(&token), "wrong_secret").is_none());
    }

    #[test]
    fn test_expired_token_fails() {
        let expired =
            generate_session_token_expiring("alice", "/img/a.png", SECRET, 1).unwrap();

        assert!(verify_session_token(Some(&expired), SECRET).is_none());
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(verify_session_token(Some(""), SECRET).is_none());
        assert!(verify_session_token(Some("invalid.token.format"), SECRET).is_none());
        assert!(verify_session_token(Some("YQ:Yg:12345"), SECRET).is_none());
        assert!(verify_session_token(Some("YQ:12345.sig"), SECRET).is_none());
    }

    #[test]
    fn test_tampered_payload() {
        let token = generate_session_token("alice", "/img/a.png", SECRET).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload = format!(
            "{}:{}:{}",
            URL_SAFE_NO_PAD.encode("mallory"),
            URL_SAFE_NO_PAD.encode("/img/a.png"),
            u64::MAX
        );

        let forged = format!("{}.{}", forged_payload, signature);
        assert!(verify_session_token(Some(&forged), SECRET).is_none());
    }

    #[test]
    fn test_different_players_different_tokens() {
        let token1 = generate_session_token("player1", "/img/a.png", SECRET).unwrap();
        let token2 = generate_session_token("player2", "/img/a.png", SECRET).unwrap();

        assert_ne!(token1, token2);
        assert_eq!(
            verify_session_token(Some(&token1), SECRET).unwrap().player_id,
            "player1"
        );
        assert_eq!(
            verify_session_token(Some(&token2), SECRET).unwrap().player_id,
            "player2"
        );
    }
}
