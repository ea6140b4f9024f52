//! HTTP API server implementation

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::core::config::ServerConfig;
use crate::core::engine::Translator;
use crate::core::errors::TranslationError;
use crate::core::languages::LanguageTable;
use crate::core::llama::LlamaGenerator;
use crate::core::models::{
    BatchTranslationRequest, BatchTranslationResponse, TargetLangs, TranslationRequest,
    TranslationResponse,
};

const LANGUAGES_MESSAGE: &str = "Use these language codes or full names in the source_lang and target_lang fields of translation requests.";

/// Application state
#[derive(Clone)]
pub struct AppState {
    translator: Translator,
    model_path: String,
}

impl AppState {
    pub fn new(translator: Translator, model_path: impl Into<String>) -> Self {
        Self {
            translator,
            model_path: model_path.into(),
        }
    }
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

/// Language table response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LanguagesResponse {
    pub language_codes: BTreeMap<String, String>,
    pub message: String,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error mapped onto an HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<TranslationError> for ApiError {
    fn from(err: TranslationError) -> Self {
        if err.is_client_error() {
            Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            }
        } else {
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("Translation failed: {err}"),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(translate, batch_translate, get_languages, health_check),
    components(schemas(
        TranslationRequest,
        TranslationResponse,
        BatchTranslationRequest,
        BatchTranslationResponse,
        TargetLangs,
        LanguagesResponse,
        HealthResponse,
        ErrorResponse
    ))
)]
struct ApiDoc;

/// Translate text into one target language
#[utoipa::path(
    post,
    path = "/translate",
    request_body = TranslationRequest,
    responses(
        (status = 200, body = TranslationResponse),
        (status = 400, description = "Missing parameters", body = ErrorResponse),
        (status = 500, description = "Inference failed", body = ErrorResponse)
    )
)]
async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslationRequest>, JsonRejection>,
) -> Result<Json<TranslationResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(e) => {
            warn!("Rejected /translate body: {}", e);
            TranslationRequest::default()
        }
    };
    let (text, source_lang, target_lang) = request.into_parts()?;

    let result = state
        .translator
        .translate(&text, &source_lang, &target_lang)
        .await
        .map_err(|e| {
            warn!("Translation failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(TranslationResponse {
        source_text: text,
        source_lang,
        source_lang_full: result.source_lang_full,
        target_lang,
        target_lang_full: result.target_lang_full,
        translation: result.translation,
    }))
}

/// Translate text into several target languages, one after another
#[utoipa::path(
    post,
    path = "/batch-translate",
    request_body = BatchTranslationRequest,
    responses(
        (status = 200, body = BatchTranslationResponse),
        (status = 400, description = "Missing parameters", body = ErrorResponse),
        (status = 500, description = "Some targets failed; partial results plus errors", body = BatchTranslationResponse)
    )
)]
async fn batch_translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchTranslationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(e) => {
            warn!("Rejected /batch-translate body: {}", e);
            BatchTranslationRequest::default()
        }
    };
    let (text, source_lang, target_langs) = request.into_parts()?;

    let result = state
        .translator
        .translate_batch(&text, &source_lang, &target_langs)
        .await;

    let has_errors = result.has_errors();
    let status = if has_errors {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    let translations = result.joined();

    let response = BatchTranslationResponse {
        source_text: text,
        source_lang,
        source_lang_full: result.source_lang_full,
        translations,
        errors: has_errors.then_some(result.errors),
    };

    Ok((status, Json(response)).into_response())
}

/// List the known language codes
#[utoipa::path(get, path = "/languages", responses((status = 200, body = LanguagesResponse)))]
async fn get_languages(State(state): State<Arc<AppState>>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        language_codes: state.translator.languages().codes().clone(),
        message: LANGUAGES_MESSAGE.to_string(),
    })
}

/// Health check handler
#[utoipa::path(get, path = "/health", responses((status = 200, body = HealthResponse)))]
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model: state.model_path.clone(),
    })
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the router over an already constructed state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/translate", post(translate))
        .route("/batch-translate", post(batch_translate))
        .route("/languages", get(get_languages))
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Load the model and run the HTTP server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let model_path = config.model.gguf_file.display().to_string();
    info!("Loading model from {}", model_path);

    let model_config = config.model.clone();
    let generator =
        tokio::task::spawn_blocking(move || LlamaGenerator::load(&model_config)).await??;

    let translator = Translator::new(
        Arc::new(generator),
        LanguageTable::builtin(),
        config.generation.clone(),
        config.max_concurrent_generations,
    );

    let app = build_router(AppState::new(translator, model_path));

    // Bind address
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
