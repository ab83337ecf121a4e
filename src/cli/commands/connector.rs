use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use log::warn;
use serde_json::Value;

use dataverse_cli::api::QueryParams;
use dataverse_cli::api::constants::{component_types, record_path};
use dataverse_cli::config::Config;
use dataverse_cli::{DataverseClient, DataverseError};

use super::connect;
use crate::cli::output::{print_error, print_info, print_json, print_success, records_of};
use crate::ui::prompts::prompt_delete_confirmation;

const CONNECTOR_SET: &str = "connectors";

#[derive(Args)]
pub struct ConnectorCommands {
    #[command(subcommand)]
    pub command: ConnectorSubcommands,
}

#[derive(Subcommand)]
pub enum ConnectorSubcommands {
    /// Delete a custom connector, reporting its dependencies first
    Delete {
        /// Connector ID (GUID)
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn connector_command(args: ConnectorCommands, config: &Config) -> Result<()> {
    match args.command {
        ConnectorSubcommands::Delete { id, yes } => delete_connector(config, &id, yes).await,
    }
}

async fn delete_connector(config: &Config, id: &str, yes: bool) -> Result<()> {
    let mut client = connect(config)?;

    print_info(&format!("Fetching connector {}...", id));
    let params = QueryParams::new().select(&["connectorid", "name", "displayname"]);
    let connector = client
        .get(&record_path(CONNECTOR_SET, id), &params)
        .await
        .with_context(|| format!("Failed to fetch connector {}", id))?;
    print_info(&format!("Found connector: {}", describe_connector(&connector)));

    print_info("Checking for dependencies...");
    match retrieve_dependencies(&mut client, id).await {
        Ok(dependencies) => match records_of(dependencies) {
            Value::Array(items) if items.is_empty() => print_info("No dependencies reported"),
            other => {
                print_info("Dependencies found:");
                print_json(&other);
            }
        },
        Err(e) => warn!("Could not retrieve dependencies for connector {}: {}", id, e),
    }

    if !yes && !prompt_delete_confirmation("connector", id)? {
        print_error("Delete cancelled");
        return Ok(());
    }

    match client.delete(&record_path(CONNECTOR_SET, id)).await {
        Ok(()) => {
            print_success(&format!("Connector deleted successfully: {}", id));
            Ok(())
        }
        Err(e) => {
            if is_dependency_error(&e) {
                print_info("The connector has dependencies that must be removed first.");
                print_info("Remove the connector from the Power Automate portal, or check for orphaned dependencies.");
            }
            Err(e.into())
        }
    }
}

/// Components that would block deleting the connector
async fn retrieve_dependencies(client: &mut DataverseClient, id: &str) -> dataverse_cli::Result<Value> {
    let params = dependency_params(id);
    client
        .get("RetrieveDependenciesForDelete(ObjectId=@id,ComponentType=@type)", &params)
        .await
}

fn dependency_params(id: &str) -> QueryParams {
    QueryParams::new()
        .param("@id", id)
        .param("@type", component_types::CONNECTOR.to_string())
}

fn describe_connector(connector: &Value) -> String {
    let field = |key: &str| connector.get(key).and_then(Value::as_str).unwrap_or("<unknown>");
    format!("{} ({})", field("displayname"), field("name"))
}

fn is_dependency_error(error: &DataverseError) -> bool {
    match error {
        DataverseError::Api { body, .. } => body.to_lowercase().contains("referenced by"),
        _ => false,
    }
}
