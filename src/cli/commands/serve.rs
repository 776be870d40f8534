//! HTTP API server for integration with other systems.
//!
//! Accepts video uploads and returns extracted keywords, their SEO ranking
//! and knowledge-graph enrichment.

use crate::audio::is_video_file;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::enrichment::OrderedMap;
use crate::error::{Result, SokordError};
use crate::orchestrator::{parse_seed_keywords, Orchestrator, RequestDir};
use crate::ranking::{KeywordFailure, KeywordScore};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

const INVALID_FILE_TYPE: &str = "Invalid file type. Only video files are allowed.";
const KEYWORDS_MESSAGE: &str = "Keywords and SEO rank generated successfully.";

/// Shared application state.
pub struct AppState {
    orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    fn settings(&self) -> &Settings {
        self.orchestrator.settings()
    }
}

/// Build the API router over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.settings().server.max_upload_mb.saturating_mul(1024 * 1024);

    Router::new()
        .route("/health", get(health))
        .route("/upload-video", post(upload_video))
        .route("/keywords", post(keywords))
        .route("/keywords/seeded", post(keywords_seeded))
        .route("/keywords/enriched", post(keywords_enriched))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<&str>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or(&settings.server.host).to_string();
    let port = port.unwrap_or(settings.server.port);

    preflight::check(Operation::Serve)?;
    std::fs::create_dir_all(settings.upload_dir())?;
    let orchestrator = Orchestrator::new(settings)?;
    let app = build_router(Arc::new(AppState::new(orchestrator)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Sokord API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Upload", "POST /upload-video");
    Output::kv("Keywords", "POST /keywords");
    Output::kv("Seeded", "POST /keywords/seeded");
    Output::kv("Enriched", "POST /keywords/enriched");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct UploadResponse {
    filename: String,
    message: &'static str,
}

#[derive(Serialize)]
struct KeywordsResponse {
    keywords: Vec<String>,
    seo_rank: Vec<KeywordScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ranking_failures: Vec<KeywordFailure>,
    message: &'static str,
}

#[derive(Serialize)]
struct EnrichedResponse {
    keywords: Vec<String>,
    seed_keywords: Vec<String>,
    keyword_ranking: Vec<KeywordScore>,
    wikidata_keywords: OrderedMap<Vec<String>>,
    associated_scores: OrderedMap<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ranking_failures: Vec<KeywordFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    enrichment_failures: Vec<KeywordFailure>,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// An error rendered as `{"error": ...}` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

/// HTTP status for a pipeline error.
pub fn status_for(err: &SokordError) -> StatusCode {
    match err {
        SokordError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SokordError::Media(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SokordError::TranscriptionUnavailable(_)
        | SokordError::SearchUnavailable(_)
        | SokordError::EnrichmentUnavailable(_)
        | SokordError::Summarization(_) => StatusCode::BAD_GATEWAY,
        SokordError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SokordError> for ApiError {
    fn from(err: SokordError) -> Self {
        Self {
            status: status_for(&err),
            message: err.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed ({}): {}", self.status, self.message);
        } else {
            warn!("Request rejected ({}): {}", self.status, self.message);
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

// === Upload handling ===

/// A validated upload saved into its own request directory.
struct Upload {
    dir: RequestDir,
    video_path: PathBuf,
    filename: String,
    seed_keywords: Vec<String>,
}

/// Read the multipart body: a `file` part and an optional `seed_keywords` part.
///
/// The file type is checked before anything is written to disk.
async fn receive_upload(state: &AppState, mut multipart: Multipart) -> std::result::Result<Upload, ApiError> {
    let mut saved: Option<(RequestDir, PathBuf, String)> = None;
    let mut seed_keywords = Vec::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .and_then(|name| Path::new(name).file_name())
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| SokordError::InvalidInput("uploaded file has no name".into()))?;

                if !is_video_file(&filename) {
                    return Err(ApiError::bad_request(INVALID_FILE_TYPE));
                }

                let dir = state.orchestrator.request_dir()?;
                let video_path = dir.path().join(&filename);
                let mut file = tokio::fs::File::create(&video_path)
                    .await
                    .map_err(SokordError::from)?;
                let mut size = 0usize;
                while let Some(chunk) = field.chunk().await? {
                    size += chunk.len();
                    file.write_all(&chunk).await.map_err(SokordError::from)?;
                }
                file.flush().await.map_err(SokordError::from)?;

                info!("Received {} ({} bytes)", filename, size);
                saved = Some((dir, video_path, filename));
            }
            Some("seed_keywords") => {
                seed_keywords = parse_seed_keywords(&field.text().await?);
            }
            _ => {}
        }
    }

    let (dir, video_path, filename) =
        saved.ok_or_else(|| SokordError::InvalidInput("no file uploaded".into()))?;

    Ok(Upload {
        dir,
        video_path,
        filename,
        seed_keywords,
    })
}

/// Bound a pipeline run by the configured request timeout.
async fn with_timeout<T>(state: &AppState, pipeline: impl Future<Output = Result<T>>) -> Result<T> {
    let secs = state.settings().server.request_timeout_seconds;
    tokio::time::timeout(Duration::from_secs(secs), pipeline)
        .await
        .map_err(|_| SokordError::Timeout(format!("processing exceeded {}s", secs)))?
}

/// Success message naming the configured summarization model.
fn enriched_message(settings: &Settings) -> String {
    format!(
        "Keywords generated using {}, seed keywords, YouTube SEO ranking, and Wikidata.",
        settings.summarization.model
    )
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> std::result::Result<Json<UploadResponse>, ApiError> {
    let mut upload = receive_upload(&state, multipart).await?;
    upload.dir.persist();
    info!("Stored upload at {}", upload.video_path.display());

    Ok(Json(UploadResponse {
        filename: upload.filename,
        message: "Video uploaded successfully.",
    }))
}

async fn keywords(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> std::result::Result<Json<KeywordsResponse>, ApiError> {
    let Upload { dir, video_path, .. } = receive_upload(&state, multipart).await?;
    let result = with_timeout(&state, state.orchestrator.run(&video_path, &[])).await;
    dir.close().await;
    let output = result?;

    Ok(Json(KeywordsResponse {
        keywords: output.keywords,
        seo_rank: output.ranking.scores,
        seed_keywords: None,
        ranking_failures: output.ranking.failures,
        message: KEYWORDS_MESSAGE,
    }))
}

async fn keywords_seeded(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> std::result::Result<Json<KeywordsResponse>, ApiError> {
    let Upload {
        dir,
        video_path,
        seed_keywords,
        ..
    } = receive_upload(&state, multipart).await?;
    let result = with_timeout(&state, state.orchestrator.run(&video_path, &seed_keywords)).await;
    dir.close().await;
    let output = result?;

    Ok(Json(KeywordsResponse {
        keywords: output.keywords,
        seo_rank: output.ranking.scores,
        seed_keywords: Some(output.seed_keywords),
        ranking_failures: output.ranking.failures,
        message: KEYWORDS_MESSAGE,
    }))
}

async fn keywords_enriched(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> std::result::Result<Json<EnrichedResponse>, ApiError> {
    let Upload {
        dir,
        video_path,
        seed_keywords,
        ..
    } = receive_upload(&state, multipart).await?;
    let result = with_timeout(
        &state,
        state.orchestrator.run_with_enrichment(&video_path, &seed_keywords),
    )
    .await;
    dir.close().await;
    let enriched = result?;

    let output = enriched.output;
    Ok(Json(EnrichedResponse {
        keywords: output.keywords,
        seed_keywords: output.seed_keywords,
        keyword_ranking: output.ranking.scores,
        wikidata_keywords: enriched.enrichment.terms,
        associated_scores: enriched.associated_scores,
        ranking_failures: output.ranking.failures,
        enrichment_failures: enriched.enrichment.failures,
        message: enriched_message(state.settings()),
    }))
}
