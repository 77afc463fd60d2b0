use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::warehouse::is_plain_identifier;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub warehouse: WarehouseConfig,
    pub search: SearchConfig,
    pub stage: StageConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    pub agent: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    /// Base URL of the account, e.g. `https://acct.snowflakecomputing.com`.
    pub account_url: String,
    pub database: String,
    pub schema: String,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Environment variable holding a pre-issued bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_token_env() -> String {
    "SNOWFLAKE_TOKEN".to_string()
}
fn default_token_type() -> String {
    "OAUTH".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_poll_interval_ms() -> u64 {
    500
}

impl WarehouseConfig {
    /// Bearer token from the configured environment variable, if set.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Fully qualified search service name.
    pub service: String,
    #[serde(default = "default_docs_table")]
    pub docs_table: String,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
}

fn default_docs_table() -> String {
    "RAW_DOCS".to_string()
}
fn default_limit() -> u32 {
    25
}
fn default_max_limit() -> u32 {
    50
}
fn default_columns() -> Vec<String> {
    [
        "DOC_ID",
        "FILENAME",
        "RELATIVE_PATH",
        "PERSON",
        "DOC_TYPE",
        "DOC_DATE",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StageConfig {
    pub name: String,
    #[serde(default = "default_presign_seconds")]
    pub presign_seconds: i64,
}

fn default_presign_seconds() -> i64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExplorerConfig {
    #[serde(default = "default_preview_limit")]
    pub preview_limit: u32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            preview_limit: default_preview_limit(),
        }
    }
}

fn default_preview_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate warehouse
    let url = config.warehouse.account_url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("warehouse.account_url must start with http:// or https://");
    }
    for (key, value) in [
        ("warehouse.database", &config.warehouse.database),
        ("warehouse.schema", &config.warehouse.schema),
        ("search.docs_table", &config.search.docs_table),
        ("stage.name", &config.stage.name),
    ] {
        if !is_plain_identifier(value) {
            anyhow::bail!("{} must be a plain identifier, got '{}'", key, value);
        }
    }
    if config.warehouse.timeout_secs == 0 {
        anyhow::bail!("warehouse.timeout_secs must be >= 1");
    }

    // Validate search
    if config.search.service.trim().is_empty() {
        anyhow::bail!("search.service must not be empty");
    }
    if config.search.max_limit == 0 {
        anyhow::bail!("search.max_limit must be >= 1");
    }
    if !(1..=config.search.max_limit).contains(&config.search.default_limit) {
        anyhow::bail!(
            "search.default_limit must be in [1, {}]",
            config.search.max_limit
        );
    }
    if config.search.columns.is_empty() {
        anyhow::bail!("search.columns must not be empty");
    }

    if config.stage.presign_seconds < 1 {
        anyhow::bail!("stage.presign_seconds must be >= 1");
    }
    if config.explorer.preview_limit == 0 {
        anyhow::bail!("explorer.preview_limit must be >= 1");
    }
    if config.agent.name.trim().is_empty() {
        anyhow::bail!("agent.name must not be empty");
    }

    Ok(())
}
