//! # Warehouse Docs
//!
//! Browse tables in a warehouse schema, run semantic search over an indexed
//! document collection, and ask a hosted retrieval/QA agent.
//!
//! Indexing, embeddings and agent reasoning all live in the warehouse; this
//! crate turns their loosely shaped responses into something displayable.
//!
//! ## Architecture
//!
//! ```text
//! query + filters ──▶ search ──▶ Warehouse ──▶ normalize ──▶ filter ──▶ hits
//!                                   ▲
//! question ────────▶ agent ─────────┘ ──────▶ extract_answer ──────▶ text
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! wdocs tables
//! wdocs search "remote work policy" --doc-type policy --from 2025-01-01
//! wdocs ask "How many documents are in RAW_DOCS?"
//! wdocs serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`warehouse`] | Query execution adapter trait and result table |
//! | [`sql_api`] | Statements API implementation of the adapter |
//! | [`models`] | Search hits and filter criteria |
//! | [`normalize`] | Raw search payload → hits |
//! | [`filter`] | Local hit filtering |
//! | [`search`] | Search action |
//! | [`agent`] | Agent call and answer extraction |
//! | [`explorer`] | Table listing and preview |
//! | [`stage`] | Presigned file URLs |
//! | [`server`] | JSON HTTP server |

pub mod agent;
pub mod config;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod render;
pub mod search;
pub mod server;
pub mod sql_api;
pub mod stage;
pub mod warehouse;
