use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::callback::CallbackOutcome;
use crate::auth::client::{AccountsApi, AccountsClient};
use crate::auth::pkce::{CHALLENGE_METHOD, PkcePair};
use crate::auth::prompt::{AuthorizationPrompt, TerminalPrompt};
use crate::auth::storage::{CredentialStore, FileStore, KeyValueStore};
use crate::auth::token::{Credential, TokenState};
use crate::config::{Config, SCOPES};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    pub state: TokenState,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Keeps one valid or refreshable credential for this device.
///
/// [`TokenManager::access_token`] reuses a fresh token, refreshes one that is
/// inside the refresh buffer, and otherwise runs a full PKCE authorization.
/// A failed refresh never reaches the caller; it falls through to
/// authorization, clearing stored tokens first when the server rejected it.
pub struct TokenManager {
    client_id: String,
    redirect_uri: String,
    auth_url: String,
    credentials: CredentialStore,
    accounts: Arc<dyn AccountsApi>,
    prompt: Arc<dyn AuthorizationPrompt>,
}

impl TokenManager {
    pub fn new(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        accounts: Arc<dyn AccountsApi>,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Self {
        Self {
            client_id: config.spotify_client_id.clone(),
            redirect_uri: config.spotify_redirect_uri.clone(),
            auth_url: config.spotify_auth_url.clone(),
            credentials: CredentialStore::new(store),
            accounts,
            prompt,
        }
    }

    /// File-backed state, HTTP token endpoint and terminal prompt.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(FileStore::new(config.state_path())),
            Arc::new(AccountsClient::new(config)),
            Arc::new(TerminalPrompt::default()),
        )
    }

    pub fn status(&self) -> Result<TokenStatus> {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> Result<TokenStatus> {
        let credential = self.credentials.load()?;
        Ok(TokenStatus {
            state: TokenState::classify(credential.as_ref(), now),
            expires_at: credential.map(|c| c.expires_at),
        })
    }

    pub async fn access_token(&self) -> Result<String> {
        let credential = self.credentials.load()?;

        match TokenState::classify(credential.as_ref(), Utc::now()) {
            TokenState::Valid(access_token) => {
                debug!("Using existing valid token");
                return Ok(access_token);
            }
            TokenState::NeedsRefresh(refresh_token) => {
                info!("Token expired, attempting refresh");
                match self.refresh(&refresh_token).await {
                    Ok(credential) => return Ok(credential.access_token),
                    Err(e) => warn!("Token refresh failed, starting authorization: {}", e),
                }
            }
            TokenState::Missing => info!("No valid tokens, starting authorization"),
        }

        self.authorize().await
    }

    /// Refreshes and persists the credential. The previous refresh token is kept
    /// when the response carries none. A server rejection clears stored tokens.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        match self.accounts.refresh(refresh_token).await {
            Ok(response) => {
                let mut credential = Credential::from_response(response, Utc::now());
                if credential.refresh_token.is_none() {
                    credential.refresh_token = Some(refresh_token.to_string());
                }
                self.credentials.save(&credential)?;
                info!("Token refresh successful");
                Ok(credential)
            }
            Err(e) => {
                if e.is_rejection() {
                    self.credentials.clear()?;
                }
                Err(e)
            }
        }
    }

    /// Generates a fresh PKCE pair, persists its verifier and returns the authorization URL.
    pub fn begin_authorization(&self) -> Result<Url> {
        let pkce = PkcePair::generate();
        self.credentials.store_verifier(&pkce.verifier)?;

        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", CHALLENGE_METHOD),
                ("scope", SCOPES),
            ],
        )?;
        Ok(url)
    }

    pub async fn authorize(&self) -> Result<String> {
        let authorize_url = self.begin_authorization()?;
        let redirect = self.prompt.authorize(&authorize_url).await?;
        let credential = self.handle_callback(&redirect).await?;
        Ok(credential.access_token)
    }

    pub async fn handle_callback(&self, uri: &str) -> Result<Credential> {
        match CallbackOutcome::parse(uri, &self.redirect_uri)? {
            CallbackOutcome::Code(code) => self.exchange_code(&code).await,
            CallbackOutcome::Error(error) => {
                warn!("Authorization error: {}", error);
                Err(AppError::AuthorizationDenied(error))
            }
            CallbackOutcome::Cancelled => {
                info!("Authorization cancelled");
                Err(AppError::AuthorizationCancelled)
            }
        }
    }

    /// Exchanges `code` using the verifier stored by [`Self::begin_authorization`].
    pub async fn exchange_code(&self, code: &str) -> Result<Credential> {
        let verifier = self
            .credentials
            .take_verifier()?
            .ok_or(AppError::MissingVerifier)?;

        let response = self.accounts.exchange_code(code, &verifier).await?;
        let credential = Credential::from_response(response, Utc::now());
        self.credentials.save(&credential)?;
        info!("Authorization successful");
        Ok(credential)
    }

    pub fn logout(&self) -> Result<()> {
        self.credentials.clear()
    }
}
