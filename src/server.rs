//! HTTP JSON API around a shared tagging engine.
//!
//! One [`TaggingEngine`] lives behind a single `tokio::sync::Mutex`, so each
//! request's read-modify-write on the engine is atomic with respect to every
//! other request. Nothing awaits while the lock is held; uploads are parsed
//! before the lock is taken.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/codes` | Code vocabulary with document counts |
//! | `POST` | `/codes` | Add a code: `{"name": "..."}` |
//! | `GET`  | `/documents` | Assignment table rows |
//! | `POST` | `/documents` | Replace documents: `{"format": "csv"\|"text", "content": "..."}` |
//! | `POST` | `/documents/{id}/codes` | Apply a code: `{"code": "..."}` |
//! | `GET`  | `/export` | Coded table as a CSV download |
//! | `GET`  | `/stats` | Corpus summary |
//! | `GET`  | `/frequencies?top=N` | Most frequent terms |
//! | `GET`  | `/sentiment` | Sentiment distribution |
//! | `GET`  | `/themes?top=N` | Keyword groupings |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "document not found: 9 (valid ids are 1..=3)" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! Malformed JSON bodies and query strings are reported as `bad_request`
//! with the same body. A document id that is numeric but outside `1..=N`
//! (including negative ids) is `not_found`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use qualcode_core::{DisplayRow, ErrorKind, TagError, TaggingEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{self, CorpusSummary, SentimentDistribution, TermCount, Theme, TokenOptions};
use crate::config::Config;
use crate::export;
use crate::ingest::{self, Format};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Mutex<TaggingEngine>>,
    config: Arc<Config>,
    tokens: Arc<TokenOptions>,
}

impl AppState {
    pub fn new(config: Config, engine: TaggingEngine) -> Self {
        let tokens = TokenOptions::from_config(&config.analysis);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }
}

/// Build the router with all endpoints and a permissive CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/codes", get(handle_list_codes).post(handle_add_code))
        .route("/documents", get(handle_list_documents).post(handle_load_documents))
        .route("/documents/{id}/codes", post(handle_apply_code))
        .route("/export", get(handle_export))
        .route("/stats", get(handle_stats))
        .route("/frequencies", get(handle_frequencies))
        .route("/sentiment", get(handle_sentiment))
        .route("/themes", get(handle_themes))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `[server].bind` until the process is terminated.
pub async fn run_server(config: &Config, engine: TaggingEngine) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let documents = engine.document_count();
    let app = router(AppState::new(config.clone(), engine));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, documents, "server listening");
    println!("qualcode server listening on http://{}", bind_addr);

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
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<TagError> for AppError {
    fn from(err: TagError) -> Self {
        warn!(error = %err, "engine rejected request");
        match err.kind() {
            ErrorKind::InvalidInput => bad_request(err.to_string()),
            ErrorKind::NotFound => not_found(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

// ============ GET /health ============

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

// ============ /codes ============

#[derive(Serialize)]
struct CodeCount {
    code: String,
    documents: usize,
}

#[derive(Serialize)]
struct CodeListResponse {
    codes: Vec<String>,
    counts: Vec<CodeCount>,
}

async fn handle_list_codes(State(state): State<AppState>) -> Json<CodeListResponse> {
    let engine = state.engine.lock().await;
    Json(CodeListResponse {
        codes: engine.labels().to_vec(),
        counts: engine
            .label_counts()
            .into_iter()
            .map(|(code, documents)| CodeCount { code, documents })
            .collect(),
    })
}

#[derive(Deserialize)]
struct AddCodeRequest {
    name: String,
}

#[derive(Serialize)]
struct AddCodeResponse {
    codes: Vec<String>,
}

async fn handle_add_code(
    State(state): State<AppState>,
    payload: Result<Json<AddCodeRequest>, JsonRejection>,
) -> Result<Json<AddCodeResponse>, AppError> {
    let Json(req) = payload?;
    let mut engine = state.engine.lock().await;
    let codes = engine.add_label(req.name.trim())?.to_vec();
    Ok(Json(AddCodeResponse { codes }))
}

// ============ /documents ============

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<DisplayRow>,
}

async fn handle_list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let engine = state.engine.lock().await;
    Json(DocumentListResponse {
        documents: engine.display_rows(),
    })
}

#[derive(Deserialize)]
struct LoadRequest {
    format: String,
    content: String,
}

#[derive(Serialize)]
struct LoadResponse {
    documents: usize,
}

async fn handle_load_documents(
    State(state): State<AppState>,
    payload: Result<Json<LoadRequest>, JsonRejection>,
) -> Result<Json<LoadResponse>, AppError> {
    let Json(req) = payload?;
    let format: Format = req
        .format
        .parse()
        .map_err(|e: anyhow::Error| bad_request(e.to_string()))?;
    let docs = ingest::parse_content(&req.content, format, &state.config.ingest)
        .map_err(|e| bad_request(format!("{:#}", e)))?;

    let documents = docs.len();
    state.engine.lock().await.reset(docs);
    info!(documents, "documents replaced via upload");
    Ok(Json(LoadResponse { documents }))
}

#[derive(Deserialize)]
struct ApplyRequest {
    code: String,
}

#[derive(Serialize)]
struct ApplyResponse {
    document_id: usize,
    labels: Vec<String>,
}

async fn handle_apply_code(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<Json<ApplyResponse>, AppError> {
    let Path(raw_id) = path?;
    let Json(req) = payload?;
    let mut engine = state.engine.lock().await;
    let id = parse_document_id(&raw_id, engine.document_count())?;
    let labels = engine.apply_label(id, &req.code)?.to_vec();
    Ok(Json(ApplyResponse {
        document_id: id,
        labels,
    }))
}

/// Digits with an optional sign are an id; anything else is malformed.
/// Ids that cannot be a valid `usize` (negative, overflowing) are unknown.
fn parse_document_id(raw: &str, count: usize) -> Result<usize, AppError> {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad_request(format!("invalid document id: {}", raw)));
    }
    raw.parse::<usize>().map_err(|_| {
        not_found(format!(
            "document not found: {} (valid ids are 1..={})",
            raw, count
        ))
    })
}

// ============ GET /export ============

async fn handle_export(State(state): State<AppState>) -> Result<Response, AppError> {
    let csv = {
        let engine = state.engine.lock().await;
        export::render_csv(&engine).map_err(|e| internal(format!("{:#}", e)))?
    };
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::export_filename(export::today())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

// ============ Analysis views ============

#[derive(Deserialize)]
struct TopQuery {
    top: Option<usize>,
}

async fn handle_stats(State(state): State<AppState>) -> Json<CorpusSummary> {
    let engine = state.engine.lock().await;
    Json(analysis::summary(engine.documents(), &state.tokens))
}

#[derive(Serialize)]
struct FrequencyResponse {
    terms: Vec<TermCount>,
}

async fn handle_frequencies(
    State(state): State<AppState>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<FrequencyResponse>, AppError> {
    let Query(q) = query?;
    let top = resolve_top(q.top, state.config.analysis.top_n)?;
    let engine = state.engine.lock().await;
    Ok(Json(FrequencyResponse {
        terms: analysis::word_frequencies(engine.documents(), &state.tokens, top),
    }))
}

async fn handle_sentiment(State(state): State<AppState>) -> Json<SentimentDistribution> {
    let engine = state.engine.lock().await;
    Json(analysis::sentiment_distribution(engine.documents()))
}

#[derive(Serialize)]
struct ThemeResponse {
    themes: Vec<Theme>,
}

async fn handle_themes(
    State(state): State<AppState>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<ThemeResponse>, AppError> {
    let Query(q) = query?;
    let top = resolve_top(q.top, state.config.analysis.theme_count)?;
    let engine = state.engine.lock().await;
    Ok(Json(ThemeResponse {
        themes: analysis::themes(engine.documents(), &state.tokens, top),
    }))
}

fn resolve_top(requested: Option<usize>, default: usize) -> Result<usize, AppError> {
    match requested {
        Some(0) => Err(bad_request("top must be >= 1")),
        Some(n) => Ok(n),
        None => Ok(default),
    }
}
