//! Shared fixtures for the mock-server integration tests

#![allow(dead_code)]

use std::collections::HashMap;

use dataverse_cli::Config;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_ID: &str = "contoso-tenant";
pub const TOKEN_PATH: &str = "/contoso-tenant/oauth2/v2.0/token";
pub const API_PREFIX: &str = "/api/data/v9.2";

pub fn config(values: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = values
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_map(&map)
}

/// Static token pointed at the mock server
pub fn token_config(server: &MockServer, token: &str) -> Config {
    let uri = server.uri();
    config(&[("BASE_URL", uri.as_str()), ("ACCESS_TOKEN", token)])
}

/// Service principal whose identity provider is the mock server
pub fn service_principal_config(server: &MockServer) -> Config {
    let uri = server.uri();
    config(&[
        ("BASE_URL", uri.as_str()),
        ("AUTHORITY_HOST", uri.as_str()),
        ("TENANT_ID", TENANT_ID),
        ("CLIENT_ID", "app-id"),
        ("CLIENT_SECRET", "app-secret"),
    ])
}

pub fn user_config(server: &MockServer) -> Config {
    let uri = server.uri();
    config(&[
        ("BASE_URL", uri.as_str()),
        ("AUTHORITY_HOST", uri.as_str()),
        ("TENANT_ID", TENANT_ID),
        ("CLIENT_ID", "app-id"),
        ("USERNAME", "user@contoso.com"),
        ("PASSWORD", "hunter2"),
    ])
}

pub fn api_path(resource: &str) -> String {
    format!("{}/{}", API_PREFIX, resource)
}

pub fn token_response(token: &str, expires_in: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "token_type": "Bearer",
        "expires_in": expires_in,
        "access_token": token
    }))
}

/// Client-credentials endpoint answering with `token`, expected `calls` times
pub async fn mount_token_endpoint(server: &MockServer, token: &str, expires_in: u64, calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(token_response(token, expires_in))
        .expect(calls)
        .mount(server)
        .await;
}
