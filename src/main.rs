//! # Warehouse Docs CLI (`wdocs`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wdocs tables` | List base tables in the configured schema |
//! | `wdocs preview <table>` | Show the first rows of a table |
//! | `wdocs filters` | List person and doc-type filter options |
//! | `wdocs search "<query>"` | Search documents, filtered locally |
//! | `wdocs ask "<question>"` | Ask the QA agent |
//! | `wdocs presign <path>` | Presigned URL for a staged file |
//! | `wdocs serve` | Start the JSON HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! wdocs --config ./config/wdocs.toml tables
//! wdocs search "invoice total" --person Bob --from 2025-01-01 --to 2025-03-31
//! wdocs search "onboarding" --json
//! wdocs ask "count by doc_type last 12 months"
//! ```

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use warehouse_docs::agent::ask_agent;
use warehouse_docs::config::{self, Config};
use warehouse_docs::error::ActionError;
use warehouse_docs::explorer;
use warehouse_docs::logging;
use warehouse_docs::models::{FilterCriteria, ANY_SELECTION};
use warehouse_docs::render::{render_hits, render_table};
use warehouse_docs::search::{preview_paths, search_documents, SearchRequest};
use warehouse_docs::server::{self, PLEASE_ASK};
use warehouse_docs::sql_api::SqlApiWarehouse;
use warehouse_docs::stage::{presigned_url, EMPTY_PATH};
use warehouse_docs::warehouse::Warehouse;

/// Warehouse Docs CLI: browse warehouse tables, search indexed documents,
/// and ask a hosted QA agent.
#[derive(Parser)]
#[command(name = "wdocs", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/wdocs.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug). Logs go to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List base tables in the configured schema, largest first.
    Tables,

    /// Show the first rows of a table.
    Preview {
        /// Table name (unqualified) in the configured schema.
        table: String,
    },

    /// List the person and document-type filter options.
    Filters,

    /// Search indexed documents and filter the hits locally.
    Search {
        /// Free-text query.
        query: String,

        /// Keep hits for this person (case-insensitive).
        #[arg(long)]
        person: Option<String>,

        /// Keep hits of this document type (case-insensitive).
        #[arg(long)]
        doc_type: Option<String>,

        /// Keep hits dated on or after this day (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Keep hits dated on or before this day (YYYY-MM-DD).
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Maximum number of results to request from the service.
        #[arg(long)]
        limit: Option<u32>,

        /// Print hits as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Ask the QA agent a question.
    Ask {
        /// The question text.
        question: String,
    },

    /// Create a presigned URL for a staged document.
    Presign {
        /// Stage-relative path, as shown in search results.
        path: String,

        /// URL validity in seconds (defaults to `[stage].presign_seconds`).
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        seconds: Option<i64>,
    },

    /// Start the JSON HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match (&cli.command, cli.verbose) {
        (Commands::Serve, 0) => "info",
        (_, v) => logging::level_for(v),
    };
    logging::init(default_level);

    // Input checks that need neither config nor network
    match &cli.command {
        Commands::Search { query, .. } if query.trim().is_empty() => {
            fail("Search", ActionError::input(warehouse_docs::search::EMPTY_QUERY))
        }
        Commands::Ask { question } if question.trim().is_empty() => {
            fail("Ask", ActionError::input(PLEASE_ASK))
        }
        Commands::Presign { path, .. } if path.trim().is_empty() => {
            fail("Presign", ActionError::input(EMPTY_PATH))
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;
    let warehouse: Arc<dyn Warehouse> = Arc::new(
        SqlApiWarehouse::new(&cfg.warehouse).context("Failed to create warehouse client")?,
    );

    match cli.command {
        Commands::Tables => match explorer::list_tables(warehouse.as_ref(), &cfg).await {
            Ok(table) => {
                println!("Tables in {}.{}", cfg.warehouse.database, cfg.warehouse.schema);
                println!("{}", render_table(&table));
            }
            Err(e) => fail("Listing tables", e),
        },
        Commands::Preview { table } => {
            match explorer::preview_table(warehouse.as_ref(), &cfg, &table).await {
                Ok(rows) => {
                    println!(
                        "Showing up to {} rows from {}.{}.{}",
                        cfg.explorer.preview_limit,
                        cfg.warehouse.database,
                        cfg.warehouse.schema,
                        table.trim()
                    );
                    println!("{}", render_table(&rows));
                }
                Err(e) => fail("Preview", e),
            }
        }
        Commands::Filters => match explorer::filter_options(warehouse.as_ref(), &cfg).await {
            Ok(options) => {
                println!("Person (optional):");
                for p in std::iter::once(ANY_SELECTION).chain(options.people.iter().map(String::as_str)) {
                    println!("  {}", p);
                }
                println!("Doc type (optional):");
                for t in std::iter::once(ANY_SELECTION).chain(options.doc_types.iter().map(String::as_str)) {
                    println!("  {}", t);
                }
            }
            Err(e) => fail("Loading filters", e),
        },
        Commands::Search {
            query,
            person,
            doc_type,
            from,
            to,
            limit,
            json,
        } => {
            let request = SearchRequest {
                query,
                limit,
                criteria: FilterCriteria::from_selections(
                    person.as_deref(),
                    doc_type.as_deref(),
                    from,
                    to,
                ),
            };
            run_search(warehouse.as_ref(), &cfg, &request, json).await?;
        }
        Commands::Ask { question } => {
            let answer = ask_agent(warehouse.as_ref(), &cfg.agent.name, question.trim()).await;
            println!("{}", answer);
        }
        Commands::Presign { path, seconds } => {
            let seconds = seconds.unwrap_or(cfg.stage.presign_seconds);
            match presigned_url(warehouse.as_ref(), &cfg.stage.name, path.trim(), seconds).await {
                Some(url) => println!("{}", url),
                None => eprintln!("warning: could not create presigned URL for '{}'", path.trim()),
            }
        }
        Commands::Serve => {
            server::run_server(Arc::new(cfg), warehouse).await?;
        }
    }

    Ok(())
}

async fn run_search(
    warehouse: &dyn Warehouse,
    cfg: &Config,
    request: &SearchRequest,
    json: bool,
) -> anyhow::Result<()> {
    let hits = match search_documents(warehouse, &cfg.search, request).await {
        Ok(hits) => hits,
        Err(e) => fail("Search", e),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    println!("{}", render_hits(&hits));
    let paths = preview_paths(&hits);
    if !paths.is_empty() {
        println!();
        println!("Preview paths (wdocs presign <path>):");
        for path in paths {
            println!("  {}", path);
        }
    }
    Ok(())
}

/// Prints an action failure and exits: status 2 for input errors (nothing
/// was sent), 1 for warehouse errors.
fn fail(action: &str, err: ActionError) -> ! {
    match err {
        ActionError::Input(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
        ActionError::Query(e) => {
            eprintln!("{} failed: {}", action, e);
            std::process::exit(1);
        }
    }
}
