use anyhow::{Result, anyhow, bail};
use clap::{Args, Subcommand};
use log::{debug, info};
use serde_json::Value;

use dataverse_cli::DataverseClient;
use dataverse_cli::api::constants::{CATEGORY_CLOUD_FLOW, component_types, record_path};
use dataverse_cli::api::{Filter, FilterValue, OrderBy, QueryParams};
use dataverse_cli::config::Config;

use super::connect;
use super::flow::print_flows;
use crate::cli::output::{print_info, print_json, print_table, records_of};

const SOLUTION_SET: &str = "solutions";
const COMPONENT_SET: &str = "solutioncomponents";
const WORKFLOW_SET: &str = "workflows";

const SOLUTION_FIELDS: [&str; 6] = [
    "solutionid",
    "friendlyname",
    "uniquename",
    "version",
    "ismanaged",
    "installedon",
];

const SOLUTION_TABLE_COLUMNS: [&str; 4] = ["friendlyname", "uniquename", "version", "managed"];

#[derive(Args)]
pub struct SolutionCommands {
    #[command(subcommand)]
    pub command: SolutionSubcommands,
}

/// Identifies a solution by ID or friendly name
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SolutionRef {
    /// Solution ID (GUID)
    #[arg(long)]
    pub id: Option<String>,
    /// Solution friendly name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Subcommand)]
pub enum SolutionSubcommands {
    /// List solutions
    List {
        /// Only managed solutions
        #[arg(long, conflicts_with = "unmanaged")]
        managed: bool,
        /// Only unmanaged solutions
        #[arg(long)]
        unmanaged: bool,
        /// Display as table
        #[arg(short, long)]
        table: bool,
    },
    /// Get solution details
    Get {
        #[command(flatten)]
        solution: SolutionRef,
    },
    /// List components of a solution
    Components {
        #[command(flatten)]
        solution: SolutionRef,
        /// Only components of this type code (e.g., 29 for workflows)
        #[arg(long = "type")]
        component_type: Option<i64>,
    },
    /// List cloud flows in a solution
    Flows {
        #[command(flatten)]
        solution: SolutionRef,
        /// Display as table
        #[arg(short, long)]
        table: bool,
    },
}

pub async fn solution_command(args: SolutionCommands, config: &Config) -> Result<()> {
    match args.command {
        SolutionSubcommands::List {
            managed,
            unmanaged,
            table,
        } => {
            let managed_filter = match (managed, unmanaged) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            let mut client = connect(config)?;
            let solutions = client.get_all(SOLUTION_SET, &list_params(managed_filter)).await?;

            if table {
                let rows: Vec<Value> = solutions.into_iter().map(with_managed_label).collect();
                print_table(&rows, &SOLUTION_TABLE_COLUMNS);
            } else {
                print_json(&Value::Array(solutions));
            }
            Ok(())
        }
        SolutionSubcommands::Get { solution } => {
            let mut client = connect(config)?;
            let result = match solution.id {
                Some(id) => {
                    let params = QueryParams::new().select(&SOLUTION_FIELDS);
                    client.get(&record_path(SOLUTION_SET, &id), &params).await?
                }
                None => {
                    let name = solution.name.unwrap_or_default();
                    find_solution(&mut client, &name).await?
                }
            };
            print_json(&result);
            Ok(())
        }
        SolutionSubcommands::Components {
            solution,
            component_type,
        } => {
            let mut client = connect(config)?;
            let solution_id = resolve_solution_id(&mut client, &solution).await?;

            let components = client
                .get_all(COMPONENT_SET, &component_params(&solution_id, component_type))
                .await?;
            print_json(&Value::Array(components));
            Ok(())
        }
        SolutionSubcommands::Flows { solution, table } => {
            let mut client = connect(config)?;
            let solution_id = resolve_solution_id(&mut client, &solution).await?;

            let components = client
                .get_all(
                    COMPONENT_SET,
                    &component_params(&solution_id, Some(component_types::WORKFLOW)),
                )
                .await?;

            let workflow_ids: Vec<String> = components
                .iter()
                .filter_map(|c| c.get("objectid").and_then(Value::as_str))
                .map(str::to_string)
                .collect();

            if workflow_ids.is_empty() {
                print_info("No workflows found in this solution");
                print_flows(Vec::new(), table);
                return Ok(());
            }

            debug!("Solution {} has {} workflow components", solution_id, workflow_ids.len());
            let flows = client
                .get_all(WORKFLOW_SET, &solution_flow_params(&workflow_ids))
                .await?;
            print_flows(flows, table);
            Ok(())
        }
    }
}

/// Solution record with the given friendly name
pub async fn find_solution(client: &mut DataverseClient, name: &str) -> Result<Value> {
    info!("Looking up solution '{}'", name);

    let params = QueryParams::new()
        .filter(Filter::eq("friendlyname", name))
        .select(&SOLUTION_FIELDS);

    let result = records_of(client.get(SOLUTION_SET, &params).await?);
    result
        .as_array()
        .and_then(|records| records.first())
        .cloned()
        .ok_or_else(|| anyhow!("Solution not found: {}", name))
}

pub async fn find_solution_id(client: &mut DataverseClient, name: &str) -> Result<String> {
    let solution = find_solution(client, name).await?;
    solution
        .get("solutionid")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Solution '{}' has no solutionid", name))
}

async fn resolve_solution_id(client: &mut DataverseClient, solution: &SolutionRef) -> Result<String> {
    match (&solution.id, &solution.name) {
        (Some(id), _) => Ok(id.clone()),
        (None, Some(name)) => find_solution_id(client, name).await,
        (None, None) => bail!("Either --id or --name must be provided"),
    }
}

fn list_params(managed: Option<bool>) -> QueryParams {
    let params = QueryParams::new()
        .select(&SOLUTION_FIELDS)
        .orderby(OrderBy::asc("friendlyname"));

    match managed {
        Some(managed) => params.filter(Filter::eq("ismanaged", managed)),
        None => params,
    }
}

fn component_params(solution_id: &str, component_type: Option<i64>) -> QueryParams {
    let mut filters = vec![Filter::eq("_solutionid_value", FilterValue::guid(solution_id))];
    if let Some(code) = component_type {
        filters.push(Filter::eq("componenttype", code));
    }

    QueryParams::new()
        .filter(Filter::and(filters))
        .select(&["solutioncomponentid", "componenttype", "objectid", "createdon"])
}

fn solution_flow_params(workflow_ids: &[String]) -> QueryParams {
    let ids = workflow_ids
        .iter()
        .map(|id| Filter::eq("workflowid", FilterValue::guid(id.as_str())))
        .collect();

    QueryParams::new()
        .filter(Filter::and(vec![
            Filter::eq("category", CATEGORY_CLOUD_FLOW),
            Filter::or(ids),
        ]))
        .select(&["workflowid", "name", "statecode", "statuscode", "modifiedon"])
}

fn with_managed_label(mut solution: Value) -> Value {
    let managed = solution.get("ismanaged").and_then(Value::as_bool).unwrap_or(false);
    if let Some(obj) = solution.as_object_mut() {
        obj.insert(
            "managed".to_string(),
            Value::String(if managed { "Yes" } else { "No" }.to_string()),
        );
    }
    solution
}
