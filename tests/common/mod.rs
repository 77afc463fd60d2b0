#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use warehouse_docs::config::{parse_config, Config};
use warehouse_docs::error::QueryError;
use warehouse_docs::warehouse::{SqlParam, Table, Warehouse};

/// Canned response for statements containing a given SQL fragment.
pub enum Reply {
    Rows(Table),
    Fail(String),
}

/// In-memory warehouse that answers by SQL fragment and records every call.
#[derive(Default)]
pub struct ScriptedWarehouse {
    replies: Vec<(String, Reply)>,
    calls: Mutex<Vec<(String, Vec<SqlParam>)>>,
}

impl ScriptedWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, fragment: &str, reply: Reply) -> Self {
        self.replies.push((fragment.to_string(), reply));
        self
    }

    /// Single-cell result, the shape of every scalar function call.
    pub fn on_scalar(self, fragment: &str, value: Value) -> Self {
        self.on(
            fragment,
            Reply::Rows(Table::new(vec!["RESULT".into()], vec![vec![value]])),
        )
    }

    pub fn on_empty(self, fragment: &str) -> Self {
        self.on(fragment, Reply::Rows(Table::new(vec!["RESULT".into()], vec![])))
    }

    pub fn on_fail(self, fragment: &str, message: &str) -> Self {
        self.on(fragment, Reply::Fail(message.to_string()))
    }

    pub fn calls(&self) -> Vec<(String, Vec<SqlParam>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Warehouse for ScriptedWarehouse {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Table, QueryError> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        for (fragment, reply) in &self.replies {
            if sql.contains(fragment.as_str()) {
                return match reply {
                    Reply::Rows(table) => Ok(table.clone()),
                    Reply::Fail(message) => Err(QueryError::Connectivity(message.clone())),
                };
            }
        }
        Err(QueryError::Statement {
            code: "002003".into(),
            message: format!("no scripted reply for: {}", sql),
        })
    }
}

pub fn test_config(account_url: &str) -> Config {
    let content = format!(
        r#"
[warehouse]
account_url = "{}"
database = "ANALYTICS_FA"
schema = "RAW"
timeout_secs = 5
poll_interval_ms = 20
token_env = "WDOCS_TEST_TOKEN_UNSET"

[search]
service = "ANALYTICS_FA.RAW.DOCS_SEARCH_FA"

[stage]
name = "RAW_DOCS_STAGE"

[agent]
name = "FA_DOCS_AGENT"

[server]
bind = "127.0.0.1:0"
"#,
        account_url
    );
    parse_config(&content).unwrap()
}
