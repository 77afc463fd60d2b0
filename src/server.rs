//! JSON HTTP server exposing the dashboard actions.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/tables` | Base tables in the configured schema |
//! | `GET`  | `/tables/{name}/preview` | First rows of one table |
//! | `GET`  | `/filters` | Person and doc-type picker options |
//! | `POST` | `/search` | Search + local filtering |
//! | `POST` | `/agent` | Ask the QA agent |
//! | `POST` | `/presign` | Presigned preview URL for a staged file |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Enter a search query first." } }
//! ```
//!
//! Error codes: `bad_request` (400, also for unreadable request bodies),
//! `timeout` (504), `warehouse_error` (502).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::agent::ask_agent;
use crate::config::Config;
use crate::error::ActionError;
use crate::explorer::{self, FilterOptions};
use crate::models::{FilterCriteria, SearchHit};
use crate::search::{preview_paths, search_documents, SearchRequest};
use crate::stage::{presigned_url, EMPTY_PATH};
use crate::warehouse::{Table, Warehouse};

pub const PLEASE_ASK: &str = "Please enter a question.";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub warehouse: Arc<dyn Warehouse>,
}

/// Builds the router; split from [`run_server`] so tests can serve it on
/// their own listener.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tables", get(handle_tables))
        .route("/tables/{name}/preview", get(handle_preview))
        .route("/filters", get(handle_filters))
        .route("/search", post(handle_search))
        .route("/agent", post(handle_agent))
        .route("/presign", post(handle_presign))
        .layer(cors)
        .with_state(state)
}

/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: Arc<Config>, warehouse: Arc<dyn Warehouse>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(AppState { config, warehouse });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);
    println!("wdocs server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Input(message) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "bad_request",
                message,
            },
            ActionError::Query(e) if e.is_timeout() => AppError {
                status: StatusCode::GATEWAY_TIMEOUT,
                code: "timeout",
                message: e.to_string(),
            },
            ActionError::Query(e) => AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "warehouse_error",
                message: e.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

// ============ Handlers ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_tables(State(state): State<AppState>) -> Result<Json<Table>, AppError> {
    let table = explorer::list_tables(state.warehouse.as_ref(), &state.config).await?;
    Ok(Json(table))
}

async fn handle_preview(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Table>, AppError> {
    let table = explorer::preview_table(state.warehouse.as_ref(), &state.config, &name).await?;
    Ok(Json(table))
}

async fn handle_filters(State(state): State<AppState>) -> Result<Json<FilterOptions>, AppError> {
    let options = explorer::filter_options(state.warehouse.as_ref(), &state.config).await?;
    Ok(Json(options))
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    query: String,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    person: Option<String>,
    #[serde(default)]
    doc_type: Option<String>,
    #[serde(default)]
    date_from: Option<NaiveDate>,
    #[serde(default)]
    date_to: Option<NaiveDate>,
}

#[derive(Serialize)]
struct SearchResponse {
    count: usize,
    hits: Vec<SearchHit>,
    preview_paths: Vec<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(body) = body?;
    let request = SearchRequest {
        query: body.query,
        limit: body.limit,
        criteria: FilterCriteria::from_selections(
            body.person.as_deref(),
            body.doc_type.as_deref(),
            body.date_from,
            body.date_to,
        ),
    };
    let hits = search_documents(state.warehouse.as_ref(), &state.config.search, &request).await?;
    let paths = preview_paths(&hits).into_iter().map(str::to_string).collect();

    Ok(Json(SearchResponse {
        count: hits.len(),
        hits,
        preview_paths: paths,
    }))
}

#[derive(Debug, Deserialize)]
struct AgentBody {
    question: String,
}

#[derive(Serialize)]
struct AgentResponse {
    answer: String,
}

async fn handle_agent(
    State(state): State<AppState>,
    body: Result<Json<AgentBody>, JsonRejection>,
) -> Result<Json<AgentResponse>, AppError> {
    let Json(body) = body?;
    let question = body.question.trim();
    if question.is_empty() {
        return Err(ActionError::input(PLEASE_ASK).into());
    }
    let answer = ask_agent(state.warehouse.as_ref(), &state.config.agent.name, question).await;
    Ok(Json(AgentResponse { answer }))
}

#[derive(Debug, Deserialize)]
struct PresignBody {
    path: String,
    #[serde(default)]
    seconds: Option<i64>,
}

#[derive(Serialize)]
struct PresignResponse {
    url: Option<String>,
}

async fn handle_presign(
    State(state): State<AppState>,
    body: Result<Json<PresignBody>, JsonRejection>,
) -> Result<Json<PresignResponse>, AppError> {
    let Json(body) = body?;
    let path = body.path.trim();
    if path.is_empty() {
        return Err(ActionError::input(EMPTY_PATH).into());
    }
    let seconds = match body.seconds {
        Some(s) if s <= 0 => {
            return Err(ActionError::input("Validity must be a positive number of seconds.").into())
        }
        Some(s) => s,
        None => state.config.stage.presign_seconds,
    };
    let url = presigned_url(state.warehouse.as_ref(), &state.config.stage.name, path, seconds).await;
    Ok(Json(PresignResponse { url }))
}
