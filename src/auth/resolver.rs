use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

use super::credentials::{AuthMode, Credentials};
use super::identity::IdentityProvider;
use super::token::Token;
use crate::config::Config;
use crate::error::{DataverseError, Result};

/// Resolves the configured credential mode and owns the single cached token.
///
/// Not synchronized: refresh runs under `&mut self`. Sharing one resolver
/// between tasks needs an outer mutex around the check-refresh-store sequence.
#[derive(Debug)]
pub struct CredentialResolver {
    credentials: Credentials,
    provider: IdentityProvider,
    cached: Option<Token>,
}

impl CredentialResolver {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Self::with_http_client(config, client)
    }

    /// Share an existing HTTP client (cheap clone) for token exchanges
    pub fn with_http_client(config: &Config, client: Client) -> Result<Self> {
        let credentials = config.credentials()?;
        let provider = IdentityProvider::new(client, config.authority_host(), config.auth_scope()?);

        debug!("Credential resolver using {} ({:?})", credentials.mode(), credentials);

        Ok(Self {
            credentials,
            provider,
            cached: None,
        })
    }

    pub fn mode(&self) -> AuthMode {
        self.credentials.mode()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn scope(&self) -> &str {
        self.provider.scope()
    }

    /// The cached token, fresh or not
    pub fn cached_token(&self) -> Option<&Token> {
        self.cached.as_ref()
    }

    /// Current valid token, exchanging for a new one when the cache is empty
    /// or within the refresh margin.
    pub async fn get_token(&mut self) -> Result<&Token> {
        let fresh = self.cached.as_ref().is_some_and(Token::is_fresh);

        if fresh {
            debug!("Using cached {} token", self.credentials.mode());
        } else {
            let token = self.provider.exchange(&self.credentials).await?;
            if token.mode() != AuthMode::AccessToken {
                info!("Obtained new {} token", token.mode());
            }
            self.cached = Some(token);
        }

        self.cached
            .as_ref()
            .ok_or_else(|| DataverseError::Authentication("No access token available".to_string()))
    }

    /// Drop the cached token so the next `get_token` exchanges again
    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            debug!("Invalidated cached {} token", self.credentials.mode());
        }
    }
}
