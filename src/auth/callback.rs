use url::Url;

use crate::error::{AppError, Result};

/// Result carried back by the authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Error(String),
    Cancelled,
}

impl CallbackOutcome {
    /// Parses `uri` and checks that it targets the registered redirect (same scheme and host).
    pub fn parse(uri: &str, redirect_uri: &str) -> Result<Self> {
        let received = Url::parse(uri.trim())?;
        let expected = Url::parse(redirect_uri)?;

        if received.scheme() != expected.scheme() || received.host_str() != expected.host_str() {
            return Err(AppError::InvalidCallback(uri.trim().to_string()));
        }

        let param = |name: &str| {
            received
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        Ok(match (param("code"), param("error")) {
            (Some(code), _) => CallbackOutcome::Code(code),
            (None, Some(error)) => CallbackOutcome::Error(error),
            (None, None) => CallbackOutcome::Cancelled,
        })
    }
}
