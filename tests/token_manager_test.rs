use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use url::Url;

use shuffleswap::auth::storage::{
    ACCESS_TOKEN_KEY, CODE_VERIFIER_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY,
};
use shuffleswap::auth::{
    AccountsApi, AuthorizationPrompt, Credential, CredentialStore, KeyValueStore, MemoryStore,
    PkcePair, TokenManager, TokenResponse, TokenState,
};
use shuffleswap::{AppError, Config, Result};

enum Reply {
    Tokens(TokenResponse),
    Rejected,
    Garbled,
}

impl Reply {
    fn into_result(self) -> Result<TokenResponse> {
        match self {
            Reply::Tokens(response) => Ok(response),
            Reply::Rejected => Err(AppError::Api {
                status: StatusCode::BAD_REQUEST,
                message: "invalid_grant".to_string(),
            }),
            Reply::Garbled => Err(serde_json::from_str::<TokenResponse>("<html>").unwrap_err().into()),
        }
    }
}

#[derive(Default)]
struct ScriptedAccounts {
    refresh_replies: Mutex<VecDeque<Reply>>,
    exchange_replies: Mutex<VecDeque<Reply>>,
    refresh_calls: Mutex<Vec<String>>,
    exchange_calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AccountsApi for ScriptedAccounts {
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        self.exchange_calls
            .lock()
            .unwrap()
            .push((code.to_string(), verifier.to_string()));
        self.exchange_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected code exchange")
            .into_result()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.refresh_calls.lock().unwrap().push(refresh_token.to_string());
        self.refresh_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected refresh")
            .into_result()
    }
}

/// Answers the authorization step with a fixed redirect, remembering the URL it was shown.
struct CannedPrompt {
    redirect: String,
    shown: Mutex<Vec<Url>>,
}

impl CannedPrompt {
    fn new(redirect: &str) -> Self {
        Self {
            redirect: redirect.to_string(),
            shown: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuthorizationPrompt for CannedPrompt {
    async fn authorize(&self, authorize_url: &Url) -> Result<String> {
        self.shown.lock().unwrap().push(authorize_url.clone());
        Ok(self.redirect.clone())
    }
}

fn tokens(access: &str, refresh: Option<&str>) -> Reply {
    Reply::Tokens(TokenResponse {
        access_token: access.to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 3600,
        refresh_token: refresh.map(str::to_string),
        scope: Some("playlist-read-private".to_string()),
    })
}

struct Harness {
    store: Arc<MemoryStore>,
    accounts: Arc<ScriptedAccounts>,
    prompt: Arc<CannedPrompt>,
    manager: TokenManager,
}

fn harness(redirect: &str) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let accounts = Arc::new(ScriptedAccounts::default());
    let prompt = Arc::new(CannedPrompt::new(redirect));
    let manager = TokenManager::new(
        &Config::with_client_id("client-123"),
        store.clone(),
        accounts.clone(),
        prompt.clone(),
    );
    Harness {
        store,
        accounts,
        prompt,
        manager,
    }
}

fn seed(store: &Arc<MemoryStore>, expires_in: Duration, refresh: Option<&str>) {
    let store: Arc<dyn KeyValueStore> = store.clone();
    CredentialStore::new(store)
        .save(&Credential {
            access_token: "old-access".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Utc::now() + expires_in,
        })
        .unwrap();
}

#[tokio::test]
async fn test_valid_token_returned_without_network() {
    let h = harness("shuffleswap://callback");
    seed(&h.store, Duration::minutes(30), Some("refresh-1"));

    assert_eq!(h.manager.access_token().await.unwrap(), "old-access");
    assert!(h.accounts.refresh_calls.lock().unwrap().is_empty());
    assert!(h.prompt.shown.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_keeps_previous_refresh_token() {
    let h = harness("shuffleswap://callback");
    seed(&h.store, Duration::minutes(4), Some("refresh-1"));
    h.accounts
        .refresh_replies
        .lock()
        .unwrap()
        .push_back(tokens("new-access", None));

    assert_eq!(h.manager.access_token().await.unwrap(), "new-access");
    assert_eq!(*h.accounts.refresh_calls.lock().unwrap(), vec!["refresh-1"]);
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("new-access"));
    assert_eq!(h.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refresh-1"));

    let expiry: i64 = h.store.get(TOKEN_EXPIRY_KEY).unwrap().unwrap().parse().unwrap();
    let remaining = expiry - Utc::now().timestamp_millis();
    assert!(remaining > 3_500_000 && remaining <= 3_600_000);
}

#[tokio::test]
async fn test_refresh_takes_rotated_refresh_token() {
    let h = harness("shuffleswap://callback");
    seed(&h.store, Duration::minutes(-10), Some("refresh-1"));
    h.accounts
        .refresh_replies
        .lock()
        .unwrap()
        .push_back(tokens("new-access", Some("refresh-2")));

    h.manager.access_token().await.unwrap();
    assert_eq!(h.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_rejected_refresh_clears_and_reauthorizes() {
    let h = harness("shuffleswap://callback?code=auth-code");
    seed(&h.store, Duration::minutes(1), Some("revoked"));
    h.accounts.refresh_replies.lock().unwrap().push_back(Reply::Rejected);
    h.accounts
        .exchange_replies
        .lock()
        .unwrap()
        .push_back(tokens("fresh-access", Some("fresh-refresh")));

    assert_eq!(h.manager.access_token().await.unwrap(), "fresh-access");
    assert_eq!(h.prompt.shown.lock().unwrap().len(), 1);
    assert_eq!(
        h.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(),
        Some("fresh-refresh")
    );
}

#[tokio::test]
async fn test_unparseable_refresh_keeps_tokens_until_reauthorized() {
    let h = harness("shuffleswap://callback");
    seed(&h.store, Duration::minutes(1), Some("refresh-1"));
    h.accounts.refresh_replies.lock().unwrap().push_back(Reply::Garbled);

    // authorization ends in cancellation, so nothing overwrites the stored tokens
    let err = h.manager.access_token().await.unwrap_err();
    assert!(matches!(err, AppError::AuthorizationCancelled));
    assert_eq!(h.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refresh-1"));
    assert_eq!(h.prompt.shown.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_authorization_url_and_code_exchange() {
    let h = harness("shuffleswap://callback?code=auth-code");
    h.accounts
        .exchange_replies
        .lock()
        .unwrap()
        .push_back(tokens("first-access", Some("first-refresh")));

    assert_eq!(h.manager.access_token().await.unwrap(), "first-access");

    let shown = h.prompt.shown.lock().unwrap().clone();
    let url = &shown[0];
    assert_eq!(url.host_str(), Some("accounts.spotify.com"));
    assert_eq!(url.path(), "/authorize");

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    };
    assert_eq!(param("client_id"), "client-123");
    assert_eq!(param("response_type"), "code");
    assert_eq!(param("redirect_uri"), "shuffleswap://callback");
    assert_eq!(param("code_challenge_method"), "S256");
    assert_eq!(
        param("scope"),
        "user-read-private playlist-read-private playlist-modify-private playlist-modify-public"
    );

    let calls = h.accounts.exchange_calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let (code, verifier) = &calls[0];
    assert_eq!(code, "auth-code");
    assert_eq!(
        param("code_challenge"),
        shuffleswap::auth::pkce::code_challenge(verifier)
    );

    // the verifier is consumed by the exchange
    assert_eq!(h.store.get(CODE_VERIFIER_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_callback_error_and_cancellation() {
    let h = harness("shuffleswap://callback");

    let err = h
        .manager
        .handle_callback("shuffleswap://callback?error=access_denied")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthorizationDenied(ref e) if e == "access_denied"));

    let err = h
        .manager
        .handle_callback("shuffleswap://callback")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthorizationCancelled));
}

#[tokio::test]
async fn test_code_without_verifier_fails() {
    let h = harness("shuffleswap://callback");

    let err = h
        .manager
        .handle_callback("shuffleswap://callback?code=stray")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MissingVerifier));
    assert!(h.accounts.exchange_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_new_authorization_overwrites_verifier() {
    let h = harness("shuffleswap://callback");
    h.manager.begin_authorization().unwrap();
    let first = h.store.get(CODE_VERIFIER_KEY).unwrap().unwrap();
    h.manager.begin_authorization().unwrap();
    let second = h.store.get(CODE_VERIFIER_KEY).unwrap().unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_status_and_logout() {
    let h = harness("shuffleswap://callback");
    assert_eq!(h.manager.status().unwrap().state, TokenState::Missing);

    seed(&h.store, Duration::minutes(6), Some("refresh-1"));
    let status = h.manager.status().unwrap();
    assert_eq!(status.state, TokenState::Valid("old-access".to_string()));
    assert!(status.expires_at.is_some());

    let later = Utc::now() + Duration::minutes(2);
    assert_eq!(
        h.manager.status_at(later).unwrap().state,
        TokenState::NeedsRefresh("refresh-1".to_string())
    );

    h.manager.logout().unwrap();
    assert_eq!(h.manager.status().unwrap().state, TokenState::Missing);
}

#[test]
fn test_generated_pairs_differ() {
    let a = PkcePair::generate();
    let b = PkcePair::generate();
    assert_ne!(a.verifier, b.verifier);
    assert_ne!(a.challenge, b.challenge);
}
