use super::commands::{
    AuthCommands, ConnectorCommands, EntityCommands, FlowCommands, SolutionCommands,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dataverse", version)]
#[command(about = "A CLI tool for interacting with the Microsoft Dataverse Web API")]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authentication checks and tokens
    Auth(AuthCommands),
    /// Query and inspect entity sets
    Entity(EntityCommands),
    /// Manage Power Automate cloud flows
    Flow(FlowCommands),
    /// Inspect solutions and their components
    Solution(SolutionCommands),
    /// Manage custom connectors
    Connector(ConnectorCommands),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flow_list() {
        let cli = Cli::try_parse_from(["dataverse", "flow", "list", "--state", "activated", "--table"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Flow(_)));
        assert!(!cli.debug);
    }

    #[test]
    fn test_global_debug_flag() {
        let cli = Cli::try_parse_from(["dataverse", "auth", "test", "--debug"]).unwrap();
        assert!(cli.debug);
    }

    #[test]
    fn test_solution_requires_id_or_name() {
        assert!(Cli::try_parse_from(["dataverse", "solution", "get"]).is_err());
        assert!(
            Cli::try_parse_from(["dataverse", "solution", "get", "--id", "a", "--name", "b"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["dataverse", "solution", "flows", "--name", "Core"]).is_ok());
    }
}
