use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens are refreshed this long before they actually expire.
pub const REFRESH_BUFFER: Duration = Duration::minutes(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Builds the credential to persist from a token endpoint response received at `received_at`.
    pub fn from_response(response: TokenResponse, received_at: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: received_at + Duration::seconds(response.expires_in),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - REFRESH_BUFFER
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// What the persisted credential allows without user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    Valid(String),
    NeedsRefresh(String),
    Missing,
}

impl TokenState {
    pub fn classify(credential: Option<&Credential>, now: DateTime<Utc>) -> Self {
        match credential {
            Some(c) if c.is_fresh(now) => TokenState::Valid(c.access_token.clone()),
            Some(Credential {
                refresh_token: Some(refresh_token),
                ..
            }) => TokenState::NeedsRefresh(refresh_token.clone()),
            _ => TokenState::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(expires_in: Duration, refresh_token: Option<&str>) -> (Credential, DateTime<Utc>) {
        let now = Utc::now();
        let credential = Credential {
            access_token: "access".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at: now + expires_in,
        };
        (credential, now)
    }

    #[test]
    fn test_inside_buffer_needs_refresh() {
        let (c, now) = credential(Duration::minutes(4), Some("refresh"));
        assert_eq!(
            TokenState::classify(Some(&c), now),
            TokenState::NeedsRefresh("refresh".to_string())
        );
    }

    #[test]
    fn test_outside_buffer_is_valid() {
        let (c, now) = credential(Duration::minutes(6), Some("refresh"));
        assert_eq!(
            TokenState::classify(Some(&c), now),
            TokenState::Valid("access".to_string())
        );
    }

    #[test]
    fn test_expired_without_refresh_token_is_missing() {
        let (c, now) = credential(Duration::minutes(-1), None);
        assert_eq!(TokenState::classify(Some(&c), now), TokenState::Missing);
        assert_eq!(TokenState::classify(None, now), TokenState::Missing);
    }

    #[test]
    fn test_expiry_from_response() {
        let json = r#"{"access_token":"a","token_type":"Bearer","expires_in":3600,"scope":"x"}"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        let received_at = Utc::now();
        let c = Credential::from_response(response, received_at);
        assert_eq!(c.expires_at, received_at + Duration::hours(1));
        assert_eq!(c.refresh_token, None);
    }
}
