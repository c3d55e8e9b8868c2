//! HTTP handlers and router.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::analyzer::TextAnalyzer;
use crate::error::AnalysisError;
use crate::sentiment::{Sentiment, SentimentResult};
use crate::store::{AnalysisRecord, SearchResult};
use crate::text::WordFrequency;

pub type AppState = Arc<TextAnalyzer>;

#[derive(OpenApi)]
#[openapi(
    paths(root, analyze_text, search_term, health_check),
    components(
        schemas(
            AnalyzeTextRequest,
            AnalyzeTextResponse,
            SearchResult,
            HealthResponse,
            ServiceInfo,
            Endpoints,
            ErrorBody,
            WordFrequency,
            SentimentResult,
            Sentiment
        )
    ),
    tags(
        (name = "analysis", description = "Text analysis and term search"),
        (name = "service", description = "Service information")
    )
)]
pub struct ApiDoc;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeTextRequest {
    #[schema(example = "Python is a fantastic language. I love Python!")]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeTextResponse {
    pub word_count: usize,
    pub most_frequent_words: Vec<WordFrequency>,
    pub sentiment_analysis: SentimentResult,
    #[schema(example = "2026-01-01T12:00:00.000000Z")]
    pub analysis_timestamp: String,
}

impl From<AnalysisRecord> for AnalyzeTextResponse {
    fn from(record: AnalysisRecord) -> Self {
        AnalyzeTextResponse {
            word_count: record.word_count,
            most_frequent_words: record.top_words,
            sentiment_analysis: record.sentiment,
            analysis_timestamp: record.timestamp,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchTermQuery {
    /// Term to look for in previously analyzed texts
    #[serde(default)]
    pub term: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub gemini_configured: bool,
    pub cache_size: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Endpoints {
    pub analyze: String,
    pub search: String,
    pub health: String,
    pub docs: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AnalysisError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            AnalysisError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Service index
#[utoipa::path(
    get,
    path = "/",
    tag = "service",
    responses((status = 200, description = "Service information", body = ServiceInfo))
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Text Analysis API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: Endpoints {
            analyze: "POST /analyze-text".to_string(),
            search: "GET /search-term?term=word".to_string(),
            health: "GET /health".to_string(),
            docs: "GET /docs".to_string(),
        },
    })
}

/// Analyze a text: word count, top words and sentiment
#[utoipa::path(
    post,
    path = "/analyze-text",
    tag = "analysis",
    request_body = AnalyzeTextRequest,
    responses(
        (status = 200, description = "Analysis result", body = AnalyzeTextResponse),
        (status = 400, description = "Empty text", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub async fn analyze_text(
    State(analyzer): State<AppState>,
    Json(req): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalyzeTextResponse>, AnalysisError> {
    let record = analyzer.analyze(&req.text).await?;
    Ok(Json(record.into()))
}

/// Search a term across previously analyzed texts
#[utoipa::path(
    get,
    path = "/search-term",
    tag = "analysis",
    params(SearchTermQuery),
    responses(
        (status = 200, description = "Search result", body = SearchResult),
        (status = 400, description = "Empty term", body = ErrorBody)
    )
)]
pub async fn search_term(
    State(analyzer): State<AppState>,
    Query(query): Query<SearchTermQuery>,
) -> Result<Json<SearchResult>, AnalysisError> {
    Ok(Json(analyzer.search(&query.term)?))
}

/// Health check with store size and AI configuration
#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check(State(analyzer): State<AppState>) -> Result<Json<HealthResponse>, AnalysisError> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        gemini_configured: analyzer.ai_configured(),
        cache_size: analyzer.store_size()?,
    }))
}

pub fn router(analyzer: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        .route("/analyze-text", post(analyze_text))
        .route("/search-term", get(search_term))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(analyzer)
}
