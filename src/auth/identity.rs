//! OAuth2 token exchange against the Microsoft identity platform

use log::{debug, info};
use reqwest::Client;
use serde_json::Value;

use super::credentials::Credentials;
use super::token::Token;
use crate::error::{DataverseError, Result};

/// Lifetime assumed when the provider omits `expires_in`
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Token endpoint of one identity provider host, requesting one scope
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    client: Client,
    authority_host: String,
    scope: String,
}

impl IdentityProvider {
    pub fn new(client: Client, authority_host: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            client,
            authority_host: authority_host.into(),
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn token_endpoint(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority_host, tenant_id)
    }

    /// Run the grant matching `credentials`. Failures are returned, never retried.
    pub async fn exchange(&self, credentials: &Credentials) -> Result<Token> {
        let (tenant_id, form): (&str, Vec<(&str, &str)>) = match credentials {
            Credentials::AccessToken(value) => return Ok(Token::fixed(value.as_str())),
            Credentials::ServicePrincipal {
                tenant_id,
                client_id,
                client_secret,
            } => (
                tenant_id.as_str(),
                vec![
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("scope", self.scope.as_str()),
                ],
            ),
            Credentials::UserPassword {
                tenant_id,
                client_id,
                username,
                password,
            } => (
                tenant_id.as_str(),
                vec![
                    ("grant_type", "password"),
                    ("client_id", client_id.as_str()),
                    ("username", username.as_str()),
                    ("password", password.as_str()),
                    ("scope", self.scope.as_str()),
                ],
            ),
        };

        let token_url = self.token_endpoint(tenant_id);
        info!("Requesting {} token from {}", credentials.mode(), token_url);

        let response = self.client.post(&token_url).form(&form).send().await?;
        let status = response.status();
        debug!("Token request status: {}", status);

        let body = response.text().await?;

        if !status.is_success() {
            return Err(DataverseError::Authentication(format!(
                "Failed to acquire token: {}",
                describe_provider_error(&body)
            )));
        }

        let token_data: Value = serde_json::from_str(&body)
            .map_err(|e| DataverseError::InvalidResponse(format!("Token response is not JSON: {}", e)))?;

        let access_token = token_data
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| DataverseError::Authentication("No access token in response".to_string()))?;

        // v1 endpoints report expires_in as a string
        let expires_in = token_data
            .get("expires_in")
            .and_then(|e| e.as_u64().or_else(|| e.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(DEFAULT_EXPIRES_IN);

        info!("Token acquired, expires in {}s", expires_in);
        Ok(Token::expiring_in(access_token, expires_in, credentials.mode()))
    }
}

/// Human-readable reason from an OAuth error body
fn describe_provider_error(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    parsed
        .as_ref()
        .and_then(|v| {
            v.get("error_description")
                .or_else(|| v.get("error"))
                .and_then(|e| e.as_str())
        })
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.trim().to_string()
            }
        })
}
