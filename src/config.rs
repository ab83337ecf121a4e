use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;

use crate::api::constants::api_path;
use crate::auth::Credentials;
use crate::error::{DataverseError, Result};

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Recognized configuration keys
pub mod keys {
    pub const BASE_URL: &str = "BASE_URL";
    pub const CLIENT_ID: &str = "CLIENT_ID";
    pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
    pub const TENANT_ID: &str = "TENANT_ID";
    pub const USERNAME: &str = "USERNAME";
    pub const PASSWORD: &str = "PASSWORD";
    pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
    pub const AUTHORITY_HOST: &str = "AUTHORITY_HOST";
}

/// Environment variable backing a configuration key
pub fn env_var(key: &str) -> String {
    match key {
        keys::BASE_URL => "DATAVERSE_URL".to_string(),
        other => format!("DATAVERSE_{}", other),
    }
}

fn is_secret(key: &str) -> bool {
    matches!(key, keys::CLIENT_SECRET | keys::PASSWORD | keys::ACCESS_TOKEN)
}

/// Connection and credential settings for one Dataverse environment.
///
/// Built once by the caller and handed to the client; nothing below this
/// type reads the process environment.
#[derive(Clone, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    pub authority_host: Option<String>,
}

impl Config {
    /// Build a config from any key/value source. Blank values count as unset.
    ///
    /// URLs and identifiers are trimmed; secrets are kept byte for byte.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |key: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).map(|v| {
                if is_secret(key) {
                    v
                } else {
                    v.trim().to_string()
                }
            })
        };

        Self {
            base_url: get(keys::BASE_URL),
            client_id: get(keys::CLIENT_ID),
            client_secret: get(keys::CLIENT_SECRET),
            tenant_id: get(keys::TENANT_ID),
            username: get(keys::USERNAME),
            password: get(keys::PASSWORD),
            access_token: get(keys::ACCESS_TOKEN),
            authority_host: get(keys::AUTHORITY_HOST),
        }
    }

    pub fn from_map(values: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    /// Read `DATAVERSE_*` variables from the process environment
    pub fn from_env() -> Self {
        info!("Loading configuration from environment variables");
        let config = Self::from_lookup(|key| std::env::var(env_var(key)).ok());
        debug!("Loaded configuration: {:?}", config);
        config
    }

    /// Base URL without a trailing slash. Required by every mode.
    pub fn base_url(&self) -> Result<String> {
        let raw = self.base_url.as_deref().ok_or_else(|| {
            DataverseError::Configuration(format!("{} is not set", env_var(keys::BASE_URL)))
        })?;

        reqwest::Url::parse(raw).map_err(|e| {
            DataverseError::Configuration(format!("Invalid base URL '{}': {}", raw, e))
        })?;

        Ok(raw.trim_end_matches('/').to_string())
    }

    /// Root of the Web API, e.g. `https://org.crm.dynamics.com/api/data/v9.2`
    pub fn api_base(&self) -> Result<String> {
        Ok(format!("{}{}", self.base_url()?, api_path()))
    }

    /// OAuth scope requested during token exchange
    pub fn auth_scope(&self) -> Result<String> {
        Ok(format!("{}/.default", self.base_url()?))
    }

    pub fn authority_host(&self) -> &str {
        self.authority_host
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORITY_HOST)
            .trim_end_matches('/')
    }

    pub fn has_token_auth(&self) -> bool {
        self.base_url.is_some() && self.access_token.is_some()
    }

    pub fn has_service_principal_auth(&self) -> bool {
        self.base_url.is_some()
            && self.client_id.is_some()
            && self.client_secret.is_some()
            && self.tenant_id.is_some()
    }

    pub fn has_user_auth(&self) -> bool {
        self.base_url.is_some()
            && self.client_id.is_some()
            && self.tenant_id.is_some()
            && self.username.is_some()
            && self.password.is_some()
    }

    /// Variables still needed for service principal auth, or nothing when any
    /// mode is already complete.
    pub fn missing_credentials(&self) -> Vec<String> {
        if self.has_token_auth() || self.has_service_principal_auth() || self.has_user_auth() {
            return Vec::new();
        }

        [
            (keys::BASE_URL, self.base_url.is_none()),
            (keys::CLIENT_ID, self.client_id.is_none()),
            (keys::CLIENT_SECRET, self.client_secret.is_none()),
            (keys::TENANT_ID, self.tenant_id.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(key, _)| env_var(key))
        .collect()
    }

    /// Pick the credential mode to authenticate with.
    ///
    /// Precedence is access token, then service principal, then username and
    /// password.
    pub fn credentials(&self) -> Result<Credentials> {
        let missing = self.missing_credentials();
        if !missing.is_empty() {
            return Err(DataverseError::Configuration(missing_credentials_message(&missing)));
        }

        // Validates the URL before any mode is chosen
        self.base_url()?;

        let mut candidates = Vec::new();
        if let (true, Some(token)) = (self.has_token_auth(), &self.access_token) {
            candidates.push(Credentials::AccessToken(token.clone()));
        }
        if let (true, Some(client_id), Some(client_secret), Some(tenant_id)) = (
            self.has_service_principal_auth(),
            &self.client_id,
            &self.client_secret,
            &self.tenant_id,
        ) {
            candidates.push(Credentials::ServicePrincipal {
                tenant_id: tenant_id.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            });
        }
        if let (true, Some(client_id), Some(tenant_id), Some(username), Some(password)) = (
            self.has_user_auth(),
            &self.client_id,
            &self.tenant_id,
            &self.username,
            &self.password,
        ) {
            candidates.push(Credentials::UserPassword {
                tenant_id: tenant_id.clone(),
                client_id: client_id.clone(),
                username: username.clone(),
                password: password.clone(),
            });
        }

        if candidates.len() > 1 {
            warn!(
                "Multiple credential modes configured, using {}",
                candidates[0].mode()
            );
        }

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| DataverseError::Configuration("No valid authentication method available".to_string()))
    }
}

fn missing_credentials_message(missing: &[String]) -> String {
    let mut message = String::from(
        "Missing required Dataverse credentials. Please set the following environment variables:\n\n",
    );
    for var in missing {
        message.push_str(&format!("  - {}\n", var));
    }

    message.push_str("\nFor service principal authentication (recommended for CLI):\n");
    message.push_str("  DATAVERSE_URL, DATAVERSE_CLIENT_ID, DATAVERSE_CLIENT_SECRET, DATAVERSE_TENANT_ID\n");
    message.push_str("\nFor user authentication:\n");
    message.push_str("  DATAVERSE_URL, DATAVERSE_CLIENT_ID, DATAVERSE_TENANT_ID, DATAVERSE_USERNAME, DATAVERSE_PASSWORD\n");
    message.push_str("\nFor token authentication (if you already have a token):\n");
    message.push_str("  DATAVERSE_URL, DATAVERSE_ACCESS_TOKEN\n");
    message
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() { "<set>" } else { "<unset>" }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("tenant_id", &self.tenant_id)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("access_token", &redact(&self.access_token))
            .field("authority_host", &self.authority_host)
            .finish()
    }
}
