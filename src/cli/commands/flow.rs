use anyhow::{Result, bail};
use clap::{Args, Subcommand, ValueEnum};
use serde_json::{Map, Value, json};

use dataverse_cli::api::constants::{CATEGORY_CLOUD_FLOW, record_path};
use dataverse_cli::api::{Filter, FilterValue, OrderBy, QueryParams};
use dataverse_cli::config::Config;

use super::connect;
use super::solution::find_solution_id;
use crate::cli::output::{print_error, print_json, print_success, print_table, records_of};
use crate::ui::prompts::prompt_delete_confirmation;

const WORKFLOW_SET: &str = "workflows";

const LOGIC_APPS_SCHEMA: &str =
    "https://schema.management.azure.com/providers/Microsoft.Logic/schemas/2016-06-01/workflowdefinition.json#";

pub const FLOW_TABLE_COLUMNS: [&str; 4] = ["name", "workflowid", "state", "modifiedon"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlowState {
    Draft,
    Activated,
}

impl FlowState {
    pub fn statecode(self) -> i64 {
        match self {
            Self::Draft => 0,
            Self::Activated => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Trigger {
    Http,
    Manual,
}

#[derive(Args)]
pub struct FlowCommands {
    #[command(subcommand)]
    pub command: FlowSubcommands,
}

#[derive(Subcommand)]
pub enum FlowSubcommands {
    /// List cloud flows
    List {
        /// Only flows belonging to this solution (friendly name)
        #[arg(short, long)]
        solution: Option<String>,
        /// Filter by state
        #[arg(long, value_enum)]
        state: Option<FlowState>,
        /// Display as table
        #[arg(short, long)]
        table: bool,
    },
    /// Get detailed information about a flow
    Get {
        /// Flow ID (GUID)
        id: String,
    },
    /// Create a new cloud flow
    Create {
        /// Flow name
        #[arg(short, long)]
        name: String,
        /// Trigger type
        #[arg(long, value_enum, default_value = "http")]
        trigger: Trigger,
        /// Solution ID to add the flow to
        #[arg(long)]
        solution_id: Option<String>,
        /// Flow description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Update an existing flow
    Update {
        /// Flow ID (GUID)
        id: String,
        /// New flow name
        #[arg(short, long)]
        name: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New state
        #[arg(long, value_enum)]
        state: Option<FlowState>,
    },
    /// Delete a flow
    Delete {
        /// Flow ID (GUID)
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Activate (turn on) a flow
    Activate {
        /// Flow ID (GUID)
        id: String,
    },
    /// Deactivate (turn off) a flow
    Deactivate {
        /// Flow ID (GUID)
        id: String,
    },
}

pub async fn flow_command(args: FlowCommands, config: &Config) -> Result<()> {
    match args.command {
        FlowSubcommands::List {
            solution,
            state,
            table,
        } => {
            let mut client = connect(config)?;
            let solution_id = match solution {
                Some(name) => Some(find_solution_id(&mut client, &name).await?),
                None => None,
            };

            let flows = client.get_all(WORKFLOW_SET, &list_params(state, solution_id.as_deref())).await?;
            print_flows(flows, table);
            Ok(())
        }
        FlowSubcommands::Get { id } => {
            let mut client = connect(config)?;
            let result = client.get(&record_path(WORKFLOW_SET, &id), &QueryParams::new()).await?;
            print_json(&result);
            Ok(())
        }
        FlowSubcommands::Create {
            name,
            trigger,
            solution_id,
            description,
        } => {
            let record = workflow_record(&name, trigger, description.as_deref(), solution_id.as_deref())?;

            let mut client = connect(config)?;
            let result = client.post(WORKFLOW_SET, &record).await?;
            let flow_id = result
                .get("workflowid")
                .or_else(|| result.get("id"))
                .cloned()
                .unwrap_or(Value::Null);

            print_success(&format!("Flow created successfully: {}", cell_text(&flow_id)));
            print_json(&json!({
                "flow_id": flow_id,
                "name": name,
                "trigger": format!("{:?}", trigger).to_lowercase(),
            }));
            Ok(())
        }
        FlowSubcommands::Update {
            id,
            name,
            description,
            state,
        } => {
            let changes = update_payload(name, description, state);
            if changes.is_empty() {
                bail!("No update parameters provided");
            }

            let mut client = connect(config)?;
            client.patch(&record_path(WORKFLOW_SET, &id), &Value::Object(changes)).await?;
            print_success(&format!("Flow updated successfully: {}", id));
            Ok(())
        }
        FlowSubcommands::Delete { id, yes } => {
            if !yes && !prompt_delete_confirmation("flow", &id)? {
                print_error("Delete cancelled");
                return Ok(());
            }

            let mut client = connect(config)?;
            client.delete(&record_path(WORKFLOW_SET, &id)).await?;
            print_success(&format!("Flow deleted successfully: {}", id));
            Ok(())
        }
        FlowSubcommands::Activate { id } => set_state(config, &id, FlowState::Activated).await,
        FlowSubcommands::Deactivate { id } => set_state(config, &id, FlowState::Draft).await,
    }
}

fn list_params(state: Option<FlowState>, solution_id: Option<&str>) -> QueryParams {
    let mut filters = vec![Filter::eq("category", CATEGORY_CLOUD_FLOW)];
    if let Some(state) = state {
        filters.push(Filter::eq("statecode", state.statecode()));
    }
    if let Some(id) = solution_id {
        filters.push(Filter::eq("solutionid", FilterValue::guid(id)));
    }

    QueryParams::new()
        .filter(Filter::and(filters))
        .select(&[
            "workflowid",
            "name",
            "statecode",
            "statuscode",
            "createdon",
            "modifiedon",
            "solutionid",
        ])
        .orderby(OrderBy::desc("modifiedon"))
}

async fn set_state(config: &Config, id: &str, state: FlowState) -> Result<()> {
    let mut client = connect(config)?;
    client
        .patch(&record_path(WORKFLOW_SET, id), &json!({"statecode": state.statecode()}))
        .await?;

    match state {
        FlowState::Activated => print_success(&format!("Flow activated successfully: {}", id)),
        FlowState::Draft => print_success(&format!("Flow deactivated successfully: {}", id)),
    }
    Ok(())
}

/// Print flows as JSON, or as a table with a readable `state` column
pub fn print_flows(flows: Vec<Value>, table: bool) {
    if !table {
        print_json(&records_of(Value::Array(flows)));
        return;
    }

    let rows: Vec<Value> = flows.into_iter().map(with_state_label).collect();
    print_table(&rows, &FLOW_TABLE_COLUMNS);
}

fn with_state_label(mut flow: Value) -> Value {
    let label = if flow.get("statecode").and_then(Value::as_i64) == Some(1) {
        "Activated"
    } else {
        "Draft"
    };
    if let Some(obj) = flow.as_object_mut() {
        obj.insert("state".to_string(), json!(label));
    }
    flow
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "<unknown>".to_string(),
        other => other.to_string(),
    }
}

fn update_payload(
    name: Option<String>,
    description: Option<String>,
    state: Option<FlowState>,
) -> Map<String, Value> {
    let mut changes = Map::new();
    if let Some(name) = name {
        changes.insert("name".to_string(), json!(name));
    }
    if let Some(description) = description {
        changes.insert("description".to_string(), json!(description));
    }
    if let Some(state) = state {
        changes.insert("statecode".to_string(), json!(state.statecode()));
    }
    changes
}

fn trigger_definition(trigger: Trigger) -> Value {
    let (name, kind) = match trigger {
        Trigger::Http => ("Incoming_Topics", "Http"),
        Trigger::Manual => ("manual", "Button"),
    };

    json!({
        name: {
            "type": "Request",
            "kind": kind,
            "inputs": {
                "schema": {
                    "type": "object",
                    "properties": {}
                }
            }
        }
    })
}

/// Logic Apps definition stored in `workflow.clientdata`
pub fn flow_definition(trigger: Trigger) -> Value {
    json!({
        "properties": {
            "connectionReferences": {},
            "definition": {
                "$schema": LOGIC_APPS_SCHEMA,
                "contentVersion": "1.0.0.0",
                "parameters": {
                    "$authentication": {
                        "defaultValue": {},
                        "type": "SecureObject"
                    },
                    "$connections": {
                        "defaultValue": {},
                        "type": "Object"
                    }
                },
                "triggers": trigger_definition(trigger),
                "actions": {}
            }
        },
        "schemaVersion": "1.0.0.0"
    })
}

/// Workflow record for a new draft cloud flow
pub fn workflow_record(
    name: &str,
    trigger: Trigger,
    description: Option<&str>,
    solution_id: Option<&str>,
) -> Result<Value> {
    let clientdata = serde_json::to_string(&flow_definition(trigger))?;

    let mut record = json!({
        "name": name,
        "type": 1,
        "category": CATEGORY_CLOUD_FLOW,
        "primaryentity": "none",
        "mode": 0,
        "ondemand": false,
        "subprocess": false,
        "scope": 4,
        "triggeroncreate": false,
        "triggerondelete": false,
        "asyncautodelete": false,
        "syncworkflowlogonfailure": false,
        "statecode": 0,
        "statuscode": 1,
        "clientdata": clientdata,
        "istransacted": true,
        "runas": 1,
        "modernflowtype": 0,
        "clientdataiscompressed": false
    });

    if let Some(obj) = record.as_object_mut() {
        if let Some(description) = description {
            obj.insert("description".to_string(), json!(description));
        }
        if let Some(solution_id) = solution_id {
            obj.insert("solutionid".to_string(), json!(solution_id));
        }
    }

    Ok(record)
}
