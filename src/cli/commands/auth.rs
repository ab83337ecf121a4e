use anyhow::Result;
use clap::{Args, Subcommand};
use log::info;
use serde_json::json;

use dataverse_cli::auth::{AuthMode, CredentialResolver};
use dataverse_cli::config::Config;

use super::connect;
use crate::cli::output::{print_json, print_success};

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Check the configured credentials by acquiring a token
    Test,
    /// Acquire an access token for the Web API
    Token {
        /// Display the full access token
        #[arg(long)]
        show: bool,
    },
    /// Show the user or application the API sees
    Whoami,
}

pub async fn auth_command(args: AuthCommands, config: &Config) -> Result<()> {
    match args.command {
        AuthSubcommands::Test => test_command(config).await,
        AuthSubcommands::Token { show } => token_command(config, show).await,
        AuthSubcommands::Whoami => whoami_command(config).await,
    }
}

async fn test_command(config: &Config) -> Result<()> {
    info!("Executing auth test command");

    let mut resolver = CredentialResolver::new(config)?;
    let credentials = resolver.credentials();

    let tenant_id = credentials.tenant_id();
    match (resolver.mode(), credentials.principal()) {
        (AuthMode::ServicePrincipal, Some(client_id)) => print_json(&json!({
            "auth_method": resolver.mode().as_str(),
            "tenant_id": tenant_id,
            "client_id": client_id
        })),
        (AuthMode::UserPassword, Some(username)) => print_json(&json!({
            "auth_method": resolver.mode().as_str(),
            "tenant_id": tenant_id,
            "username": username
        })),
        (mode, _) => print_json(&json!({"auth_method": mode.as_str()})),
    }

    if resolver.mode() == AuthMode::AccessToken {
        print_success("Using provided access token");
        return Ok(());
    }

    let scope = resolver.scope().to_string();
    let token = resolver.get_token().await?;

    print_success("Authentication successful!");
    print_json(&json!({
        "token_type": "Bearer",
        "expires_at": token.expires_at().map(|t| t.to_rfc3339()),
        "scope": scope,
    }));

    Ok(())
}

async fn token_command(config: &Config, show: bool) -> Result<()> {
    info!("Executing auth token command");

    let mut resolver = CredentialResolver::new(config)?;
    let mode = resolver.mode();
    let token = resolver.get_token().await?;

    match mode {
        AuthMode::AccessToken => print_success("Using configured access token"),
        AuthMode::ServicePrincipal => print_success("Token acquired successfully (service principal)"),
        AuthMode::UserPassword => print_success("Token acquired successfully (user credentials)"),
    }

    if show {
        print_json(&json!({"access_token": token.value()}));
    } else {
        print_json(&json!({
            "message": "Token acquired successfully",
            "expires_at": token.expires_at().map(|t| t.to_rfc3339()),
            "hint": "Use --show to display the full token"
        }));
    }

    Ok(())
}

async fn whoami_command(config: &Config) -> Result<()> {
    info!("Executing auth whoami command");

    let mut client = connect(config)?;
    let result = client.whoami().await?;

    print_success("Authentication verified!");
    print_json(&result);
    Ok(())
}
