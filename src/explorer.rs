//! Schema browsing: table listing, row preview, and filter option lists.

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::ActionError;
use crate::warehouse::{is_plain_identifier, SqlParam, Table, Warehouse};

/// Base tables in the configured schema, largest first.
pub async fn list_tables(warehouse: &dyn Warehouse, config: &Config) -> Result<Table, ActionError> {
    // The database name is a validated identifier (see `config::load_config`).
    let sql = format!(
        r#"
        SELECT t.table_schema, t.table_name, t.row_count,
               COALESCE(m.active_bytes, 0) / POWER(1024, 2) AS size_mb,
               t.created
        FROM {db}.INFORMATION_SCHEMA.TABLES t
        LEFT JOIN {db}.INFORMATION_SCHEMA.TABLE_STORAGE_METRICS m
          ON m.table_schema = t.table_schema AND m.table_name = t.table_name
        WHERE t.table_schema = ? AND t.table_type = 'BASE TABLE'
        ORDER BY size_mb DESC, t.table_name
        "#,
        db = config.warehouse.database
    );
    let params = [SqlParam::from(config.warehouse.schema.as_str())];
    Ok(warehouse.execute(&sql, &params).await?)
}

/// Up to `explorer.preview_limit` rows of `table` in the configured schema.
pub async fn preview_table(
    warehouse: &dyn Warehouse,
    config: &Config,
    table: &str,
) -> Result<Table, ActionError> {
    let table = table.trim();
    if table.is_empty() {
        return Err(ActionError::input("Pick a table to preview."));
    }
    if !is_plain_identifier(table) {
        return Err(ActionError::input(format!("Not a valid table name: '{}'", table)));
    }

    let params = [
        SqlParam::from(qualified(config, table)),
        SqlParam::from(config.explorer.preview_limit),
    ];
    Ok(warehouse
        .execute("SELECT * FROM IDENTIFIER(?) LIMIT ?", &params)
        .await?)
}

/// Picker options for the local search filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub people: Vec<String>,
    pub doc_types: Vec<String>,
}

/// Distinct people and (lower-cased) document types from the docs table.
pub async fn filter_options(
    warehouse: &dyn Warehouse,
    config: &Config,
) -> Result<FilterOptions, ActionError> {
    let docs = SqlParam::from(qualified(config, &config.search.docs_table));

    let people = warehouse
        .execute(
            "SELECT DISTINCT PERSON FROM IDENTIFIER(?) WHERE PERSON IS NOT NULL ORDER BY 1",
            std::slice::from_ref(&docs),
        )
        .await?;
    let doc_types = warehouse
        .execute(
            "SELECT DISTINCT LOWER(DOC_TYPE) AS DOC_TYPE FROM IDENTIFIER(?) \
             WHERE DOC_TYPE IS NOT NULL ORDER BY 1",
            std::slice::from_ref(&docs),
        )
        .await?;

    Ok(FilterOptions {
        people: text_column(&people, "PERSON"),
        doc_types: text_column(&doc_types, "DOC_TYPE"),
    })
}

fn qualified(config: &Config, table: &str) -> String {
    format!(
        "{}.{}.{}",
        config.warehouse.database, config.warehouse.schema, table
    )
}

fn text_column(table: &Table, name: &str) -> Vec<String> {
    table
        .column(name)
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}
