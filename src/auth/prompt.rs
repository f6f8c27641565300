use std::io::{self, Write};

use async_trait::async_trait;
use tracing::warn;
use url::Url;

use crate::error::Result;

/// Hands the authorization URL to the user and returns the redirect URI they end up on.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    async fn authorize(&self, authorize_url: &Url) -> Result<String>;
}

/// Opens the system browser and asks for the redirect URL on stdin.
pub struct TerminalPrompt {
    open_browser: bool,
}

impl TerminalPrompt {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl AuthorizationPrompt for TerminalPrompt {
    async fn authorize(&self, authorize_url: &Url) -> Result<String> {
        if self.open_browser && webbrowser::open(authorize_url.as_str()).is_err() {
            warn!("Failed to open browser");
        }

        println!("\nOpen this URL in your browser to authorize Spotify:");
        println!("{}\n", authorize_url);

        print!("Enter the URL you were redirected to: ");
        io::stdout().flush()?;

        let mut redirect_url = String::new();
        io::stdin().read_line(&mut redirect_url)?;

        Ok(redirect_url.trim().to_string())
    }
}
