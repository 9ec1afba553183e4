use serde::{Deserialize, Serialize};

use crate::core::WINNER_MARKER;

/// Identity asserted by the provider when opening a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Stable player id from the identity provider
    pub id: String,
    /// Avatar URL, if the provider has one
    #[serde(default)]
    pub picture: Option<String>,
}

impl SessionRequest {
    /// Validate and clean the player id
    ///
    /// # Validation Rules
    ///
    /// - Must not be empty after trimming
    /// - Length: 1-128 bytes
    /// - No control characters and no whitespace
    /// - Not the board's winner marker in any letter case, which would make
    ///   an owned cell read as the elected one
    pub fn validate_id(id: &str) -> Result<String, String> {
        let cleaned = id.trim();

        if cleaned.is_empty() {
            return Err("Player id cannot be empty".to_string());
        }

        if cleaned.len() > 128 {
            return Err("Player id must be 128 bytes or less".to_string());
        }

        if cleaned
            .chars()
            .any(|c| c.is_control() || c.is_whitespace())
        {
            return Err("Player id must not contain whitespace or control characters".to_string());
        }

        if cleaned.eq_ignore_ascii_case(WINNER_MARKER) {
            return Err("Player id is reserved".to_string());
        }

        Ok(cleaned.to_string())
    }

    /// Validate the avatar reference
    ///
    /// # Returns
    ///
    /// The trimmed picture URL, None when absent or blank
    pub fn validate_picture(picture: Option<&str>) -> Result<Option<String>, String> {
        let Some(picture) = picture.map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        if picture.len() > 2048 {
            return Err("Picture URL must be 2048 bytes or less".to_string());
        }

        let allowed = picture.starts_with("https://")
            || picture.starts_with("http://")
            || picture.starts_with('/');
        if !allowed {
            return Err("Picture must be an http(s) URL or a site path".to_string());
        }

        Ok(Some(picture.to_string()))
    }

    /// Validate every field, returning the cleaned request
    pub fn validated(self) -> Result<Self, String> {
        Ok(Self {
            id: Self::validate_id(&self.id)?,
            picture: Self::validate_picture(self.picture.as_deref())?,
        })
    }
}
