//! [`Warehouse`] implementation over the warehouse's REST statements API.
//!
//! # Protocol
//!
//! - `POST /api/v2/statements?requestId=<uuid>` submits one statement with
//!   positional bindings (`"1"`, `"2"`, ...).
//! - `200` carries the first result partition; `202` means the statement is
//!   still running and is polled via `statementStatusUrl` until it finishes
//!   or `timeout_secs` elapses.
//! - Further partitions are fetched with
//!   `GET /api/v2/statements/{handle}?partition=N`.
//! - Error responses carry `{ "code": "...", "message": "..." }`.
//!
//! All cells arrive as strings (or null) and are decoded using the column's
//! `rowType` entry.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::WarehouseConfig;
use crate::error::QueryError;
use crate::warehouse::{SqlParam, Table, Warehouse};

/// Warehouse client speaking the statements API.
pub struct SqlApiWarehouse {
    client: reqwest::Client,
    base_url: String,
    config: WarehouseConfig,
    token: Option<String>,
}

impl SqlApiWarehouse {
    pub fn new(config: &WarehouseConfig) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs + 10))
            .user_agent(concat!("wdocs/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.account_url.trim_end_matches('/').to_string(),
            config: config.clone(),
            token: config.token(),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => builder
                .bearer_auth(token)
                .header("X-Snowflake-Authorization-Token-Type", &self.config.token_type),
            None => builder,
        }
    }

    fn statement_body(&self, sql: &str, params: &[SqlParam]) -> Value {
        let bindings: Map<String, Value> = params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                (
                    (i + 1).to_string(),
                    serde_json::json!({ "type": p.type_name(), "value": p.wire_value() }),
                )
            })
            .collect();

        let mut body = serde_json::json!({
            "statement": sql,
            "timeout": self.config.timeout_secs,
            "database": self.config.database,
            "schema": self.config.schema,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(ref wh) = self.config.warehouse {
                obj.insert("warehouse".into(), Value::String(wh.clone()));
            }
            if let Some(ref role) = self.config.role {
                obj.insert("role".into(), Value::String(role.clone()));
            }
            if !bindings.is_empty() {
                obj.insert("bindings".into(), Value::Object(bindings));
            }
        }
        body
    }

    fn resolve(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}/{}", self.base_url, path_or_url.trim_start_matches('/'))
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Reply, QueryError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        classify(status, &text)
    }

    async fn fetch_partition(&self, handle: &str, partition: usize) -> Result<Vec<Vec<Value>>, QueryError> {
        let url = format!("{}/api/v2/statements/{}", self.base_url, handle);
        let builder = self
            .request(Method::GET, &url)
            .query(&[("partition", partition.to_string())]);
        match self.send(builder).await? {
            Reply::Done(resp) => Ok(resp.data),
            Reply::Pending(_) => Err(QueryError::Protocol(format!(
                "partition {} of statement {} is not ready",
                partition, handle
            ))),
        }
    }
}

#[async_trait]
impl Warehouse for SqlApiWarehouse {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Table, QueryError> {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(request_id = %request_id, params = params.len(), "submitting statement");

        let url = format!("{}/api/v2/statements", self.base_url);
        let builder = self
            .request(Method::POST, &url)
            .query(&[("requestId", request_id.as_str())])
            .json(&self.statement_body(sql, params));

        let mut reply = self.send(builder).await?;
        let response = loop {
            match reply {
                Reply::Done(resp) => break resp,
                Reply::Pending(status_url) => {
                    if started.elapsed() >= Duration::from_secs(self.config.timeout_secs) {
                        return Err(QueryError::Timeout(self.config.timeout_secs));
                    }
                    tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                    let builder = self.request(Method::GET, &self.resolve(&status_url));
                    reply = self.send(builder).await?;
                }
            }
        };

        let meta = response
            .meta
            .ok_or_else(|| QueryError::Protocol("response has no resultSetMetaData".into()))?;
        let mut raw_rows = response.data;

        if meta.partition_info.len() > 1 {
            let handle = response.handle.ok_or_else(|| {
                QueryError::Protocol("multi-partition result without statementHandle".into())
            })?;
            for partition in 1..meta.partition_info.len() {
                raw_rows.extend(self.fetch_partition(&handle, partition).await?);
            }
        }

        tracing::debug!(
            request_id = %request_id,
            rows = raw_rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "statement finished"
        );
        Ok(decode_table(&meta.row_type, raw_rows))
    }
}

// ============ Wire types ============

#[derive(Debug, Deserialize)]
struct StatementResponse {
    #[serde(rename = "resultSetMetaData")]
    meta: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
    #[serde(rename = "statementHandle")]
    handle: Option<String>,
    #[serde(rename = "statementStatusUrl")]
    status_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultSetMetaData {
    #[serde(rename = "rowType", default)]
    row_type: Vec<ColumnType>,
    #[serde(rename = "partitionInfo", default)]
    partition_info: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    scale: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: Option<String>,
    message: Option<String>,
}

enum Reply {
    Done(StatementResponse),
    Pending(String),
}

fn classify(status: StatusCode, body: &str) -> Result<Reply, QueryError> {
    if status == StatusCode::ACCEPTED {
        let resp: StatementResponse = serde_json::from_str(body)
            .map_err(|e| QueryError::Protocol(format!("bad 202 body: {}", e)))?;
        let url = resp
            .status_url
            .or_else(|| resp.handle.map(|h| format!("/api/v2/statements/{}", h)))
            .ok_or_else(|| QueryError::Protocol("202 without statement handle".into()))?;
        return Ok(Reply::Pending(url));
    }

    if status.is_success() {
        let resp: StatementResponse = serde_json::from_str(body)
            .map_err(|e| QueryError::Protocol(format!("bad result body: {}", e)))?;
        return Ok(Reply::Done(resp));
    }

    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            code: Some(code),
            message: Some(message),
        }) => Err(QueryError::Statement { code, message }),
        _ => Err(QueryError::Http {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        }),
    }
}

fn decode_table(row_type: &[ColumnType], raw_rows: Vec<Vec<Value>>) -> Table {
    let columns = row_type.iter().map(|c| c.name.clone()).collect();
    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(row_type)
                .map(|(cell, col)| decode_cell(col, cell))
                .collect()
        })
        .collect();
    Table::new(columns, rows)
}

fn decode_cell(column: &ColumnType, cell: Value) -> Value {
    let Value::String(raw) = cell else {
        return cell;
    };

    let decoded = match column.kind.to_ascii_lowercase().as_str() {
        "fixed" if column.scale.unwrap_or(0) == 0 => raw.parse::<i64>().ok().map(Value::from),
        "fixed" | "real" => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        "boolean" => match raw.as_str() {
            "true" | "TRUE" | "1" => Some(Value::Bool(true)),
            "false" | "FALSE" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        "date" => raw
            .parse::<i64>()
            .ok()
            .and_then(epoch_days_to_iso)
            .map(Value::String),
        _ => None,
    };

    decoded.unwrap_or(Value::String(raw))
}

fn epoch_days_to_iso(days: i64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    let date = epoch.checked_add_signed(TimeDelta::try_days(days)?)?;
    Some(date.format("%Y-%m-%d").to_string())
}
