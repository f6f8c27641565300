pub mod callback;
pub mod client;
pub mod manager;
pub mod pkce;
pub mod prompt;
pub mod storage;
pub mod token;

pub use callback::CallbackOutcome;
pub use client::{AccountsApi, AccountsClient};
pub use manager::{TokenManager, TokenStatus};
pub use pkce::PkcePair;
pub use prompt::{AuthorizationPrompt, TerminalPrompt};
pub use storage::{CredentialStore, FileStore, KeyValueStore, MemoryStore};
pub use token::{Credential, TokenResponse, TokenState};
