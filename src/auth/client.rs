use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::auth::token::TokenResponse;
use crate::config::Config;
use crate::error::{AppError, Result};

/// Token endpoint of the accounts service.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

pub struct AccountsClient {
    http_client: Client,
    token_url: String,
    client_id: String,
    redirect_uri: String,
}

impl AccountsClient {
    pub fn new(config: &Config) -> Self {
        Self::with_http_client(Client::new(), config)
    }

    pub fn with_http_client(http_client: Client, config: &Config) -> Self {
        Self {
            http_client,
            token_url: config.spotify_token_url.clone(),
            client_id: config.spotify_client_id.clone(),
            redirect_uri: config.spotify_redirect_uri.clone(),
        }
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AccountsApi for AccountsClient {
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        debug!("Exchanging authorization code for tokens");
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", verifier),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        debug!("Refreshing access token");
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ])
        .await
    }
}
