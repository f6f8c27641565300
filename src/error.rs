use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spotify API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Code verifier missing")]
    MissingVerifier,

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Authorization cancelled")]
    AuthorizationCancelled,

    #[error("Unexpected callback URI: {0}")]
    InvalidCallback(String),

    #[error("Failed to get user information")]
    UserLookup,

    #[error("Exactly two playlists must be selected, got {0}")]
    InvalidSelection(usize),
}

impl AppError {
    /// Builds an [`AppError::Api`] from a non-success response, consuming its body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let message = response.text().await.unwrap_or_default();
        AppError::Api { status, message }
    }

    /// True when the remote service answered with a non-success status.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AppError::Api { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
