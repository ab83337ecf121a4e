pub mod auth;
pub mod connector;
pub mod entity;
pub mod flow;
pub mod solution;

use anyhow::Result;
use dataverse_cli::DataverseClient;
use dataverse_cli::config::Config;

pub use auth::{AuthCommands, auth_command};
pub use connector::{ConnectorCommands, connector_command};
pub use entity::{EntityCommands, entity_command};
pub use flow::{FlowCommands, flow_command};
pub use solution::{SolutionCommands, solution_command};

/// Client for command handlers; fails early on incomplete configuration
pub(crate) fn connect(config: &Config) -> Result<DataverseClient> {
    Ok(DataverseClient::new(config)?)
}
