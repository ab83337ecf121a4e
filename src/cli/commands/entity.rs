use anyhow::Result;
use clap::{Args, Subcommand};
use log::info;
use serde_json::{Value, json};

use dataverse_cli::api::constants::{annotations, record_path};
use dataverse_cli::api::{Filter, OrderBy, QueryParams};
use dataverse_cli::config::Config;

use super::connect;
use crate::cli::output::{default_columns, print_json, print_table, records_of};

/// Columns shown by `--table` when the record shape is unknown
const MAX_TABLE_COLUMNS: usize = 6;

#[derive(Args)]
pub struct EntityCommands {
    #[command(subcommand)]
    pub command: EntitySubcommands,
}

#[derive(Subcommand)]
pub enum EntitySubcommands {
    /// Query an entity set with OData options
    Query {
        /// Entity set name (e.g., workflows, accounts)
        entity: String,
        /// OData filter expression
        #[arg(short, long)]
        filter: Option<String>,
        /// Comma-separated list of fields
        #[arg(short, long)]
        select: Option<String>,
        /// Order by clause (e.g., "modifiedon desc")
        #[arg(short, long)]
        orderby: Option<String>,
        /// Limit number of results
        #[arg(short, long)]
        top: Option<u32>,
        /// Follow next links and return every page
        #[arg(long)]
        all: bool,
        /// Records per page requested from the server
        #[arg(long)]
        page_size: Option<u32>,
        /// Display as table
        #[arg(long)]
        table: bool,
    },
    /// Get a specific record by ID
    Get {
        /// Entity set name (e.g., workflows)
        entity: String,
        /// Record ID (GUID)
        id: String,
        /// Comma-separated list of fields
        #[arg(short, long)]
        select: Option<String>,
    },
    /// Count records in an entity set
    Count {
        /// Entity set name
        entity: String,
        /// OData filter expression
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show metadata for an entity
    Metadata {
        /// Entity logical name (e.g., workflow, account)
        entity: String,
    },
}

pub async fn entity_command(args: EntityCommands, config: &Config) -> Result<()> {
    match args.command {
        EntitySubcommands::Query {
            entity,
            filter,
            select,
            orderby,
            top,
            all,
            page_size,
            table,
        } => {
            info!("Querying entity set {}", entity);
            let params = query_params(filter, select, orderby, top);

            let mut client = connect(config)?;
            if let Some(size) = page_size {
                client = client.with_page_size(size);
            }

            let data = if all {
                Value::Array(client.get_all(&entity, &params).await?)
            } else {
                records_of(client.get(&entity, &params).await?)
            };

            match data.as_array() {
                Some(records) if table && !records.is_empty() => {
                    let columns = default_columns(records, MAX_TABLE_COLUMNS);
                    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                    print_table(records, &columns);
                }
                _ => print_json(&data),
            }
            Ok(())
        }
        EntitySubcommands::Get { entity, id, select } => {
            let params = match select {
                Some(fields) => QueryParams::new().select_raw(fields),
                None => QueryParams::new(),
            };

            let mut client = connect(config)?;
            let result = client.get(&record_path(&entity, &id), &params).await?;
            print_json(&records_of(result));
            Ok(())
        }
        EntitySubcommands::Count { entity, filter } => {
            let mut params = QueryParams::new().count().top(1);
            if let Some(filter) = filter {
                params = params.filter_raw(filter);
            }

            let mut client = connect(config)?;
            let result = client.get(&entity, &params).await?;
            let count = result
                .get(annotations::COUNT)
                .and_then(Value::as_u64)
                .unwrap_or(0);

            print_json(&json!({"entity": entity, "count": count}));
            Ok(())
        }
        EntitySubcommands::Metadata { entity } => {
            let params = metadata_params(&entity);

            let mut client = connect(config)?;
            let result = records_of(client.get("EntityDefinitions", &params).await?);
            match result.as_array().and_then(|a| a.first()) {
                Some(first) => print_json(first),
                None => print_json(&result),
            }
            Ok(())
        }
    }
}

fn query_params(
    filter: Option<String>,
    select: Option<String>,
    orderby: Option<String>,
    top: Option<u32>,
) -> QueryParams {
    let mut params = QueryParams::new();
    if let Some(filter) = filter {
        params = params.filter_raw(filter);
    }
    if let Some(select) = select {
        params = params.select_raw(select);
    }
    if let Some(orderby) = orderby {
        params = params.orderby(OrderBy::raw(orderby));
    }
    if let Some(top) = top {
        params = params.top(top);
    }
    params
}

fn metadata_params(logical_name: &str) -> QueryParams {
    QueryParams::new()
        .filter(Filter::eq("LogicalName", logical_name))
        .select(&[
            "LogicalName",
            "DisplayName",
            "PrimaryIdAttribute",
            "PrimaryNameAttribute",
            "EntitySetName",
        ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_pass_options_verbatim() {
        let params = query_params(
            Some("category eq 5".to_string()),
            Some("name,workflowid".to_string()),
            Some("modifiedon desc".to_string()),
            Some(10),
        );

        assert_eq!(params.get("$filter"), Some("category eq 5"));
        assert_eq!(params.get("$select"), Some("name,workflowid"));
        assert_eq!(params.get("$orderby"), Some("modifiedon desc"));
        assert_eq!(params.get("$top"), Some("10"));
        assert!(query_params(None, None, None, None).is_empty());
    }

    #[test]
    fn test_metadata_filter_quotes_logical_name() {
        let params = metadata_params("account");
        assert_eq!(params.get("$filter"), Some("LogicalName eq 'account'"));
    }
}
