use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const DEFAULT_REDIRECT_URI: &str = "shuffleswap://callback";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Scopes requested during authorization. Must match the app registration.
pub const SCOPES: &str =
    "user-read-private playlist-read-private playlist-modify-private playlist-modify-public";

pub const DEFAULT_PLAYLIST_NAME: &str = "ShufflyMix";
pub const PLAYLIST_DESCRIPTION: &str = "Mixed playlist created by ShuffleSwap";

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_redirect_uri: String,
    pub spotify_auth_url: String,
    pub spotify_token_url: String,
    pub spotify_api_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let spotify_client_id = std::env::var("SPOTIFY_CLIENT_ID")
            .map_err(|_| AppError::Config("SPOTIFY_CLIENT_ID not set".into()))?;

        let spotify_redirect_uri = std::env::var("SPOTIFY_REDIRECT_URI")
            .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string());

        let spotify_auth_url =
            std::env::var("SPOTIFY_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string());

        let spotify_token_url =
            std::env::var("SPOTIFY_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string());

        let spotify_api_url =
            std::env::var("SPOTIFY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let data_dir = match std::env::var("SHUFFLESWAP_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir(),
        };

        Ok(Self {
            spotify_client_id,
            spotify_redirect_uri,
            spotify_auth_url,
            spotify_token_url,
            spotify_api_url,
            data_dir,
        })
    }

    /// Configuration with the public Spotify endpoints and the given client id.
    pub fn with_client_id(client_id: impl Into<String>) -> Self {
        Self {
            spotify_client_id: client_id.into(),
            spotify_redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            spotify_auth_url: DEFAULT_AUTH_URL.to_string(),
            spotify_token_url: DEFAULT_TOKEN_URL.to_string(),
            spotify_api_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
        }
    }

    pub fn get_missing_config(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if self.spotify_client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID".to_string());
        }
        if self.spotify_redirect_uri.is_empty() {
            missing.push("SPOTIFY_REDIRECT_URI".to_string());
        }

        missing
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("shuffleswap");
    path
}
