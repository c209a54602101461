//! HTTP API for uploading documents and chatting with them.
//!
//! Routes:
//! - `GET  /health`
//! - `POST /api/upload?name=<file name>` (raw PDF body)
//! - `POST /api/ingest`
//! - `POST /api/query` (JSON or Server-Sent Events when `stream` is set)
//! - `POST /api/messages`

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::domain::errors::PipelineError;
use crate::domain::models::{ChatMessage, ServerConfig, StoredMessage, UploadedFile};
use crate::infrastructure::AppContext;

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub file_key: String,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub chat_id: Uuid,
    pub pages: usize,
    pub records: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub chat_id: Uuid,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRequest {
    pub chat_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// A pipeline error rendered as an HTTP response.
struct ApiFailure(PipelineError);

impl From<PipelineError> for ApiFailure {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::NotFound(_) | PipelineError::ChatNotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::Parse(_) | PipelineError::EmptyDocument(_) | PipelineError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PipelineError::Embedding(_)
        | PipelineError::Indexing(_)
        | PipelineError::Retrieval(_)
        | PipelineError::Generation(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(error = %self.0, code = self.0.code(), "request failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.0.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the API router over `app`.
pub fn build_router(app: AppContext, enable_cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/upload", post(upload))
        .route("/api/ingest", post(ingest))
        .route("/api/query", post(query))
        .route("/api/messages", post(messages))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(app);

    if enable_cors {
        router
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    } else {
        router.layer(TraceLayer::new_for_http())
    }
}

/// HTTP server.
pub struct ApiServer {
    config: ServerConfig,
    app: AppContext,
}

impl ApiServer {
    pub fn new(app: AppContext, config: ServerConfig) -> Self {
        Self { config, app }
    }

    /// Start the server and run until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = build_router(self.app, self.config.enable_cors);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("pdfchat HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

// Handler functions

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn upload(
    State(app): State<AppContext>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadedFile>, ApiFailure> {
    let uploaded = app.chats.upload(body, &params.name).await?;
    Ok(Json(uploaded))
}

async fn ingest(
    State(app): State<AppContext>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiFailure> {
    let file = UploadedFile {
        file_key: request.file_key,
        file_name: request.file_name,
    };
    let (chat, report) = app.chats.create_chat(&file).await?;
    Ok(Json(IngestResponse {
        chat_id: chat.id,
        pages: report.pages,
        records: report.records,
    }))
}

async fn query(State(app): State<AppContext>, Json(request): Json<QueryRequest>) -> Result<Response, ApiFailure> {
    if !request.stream {
        let response = app.chats.ask(request.chat_id, &request.messages).await?;
        return Ok(Json(QueryResponse { response }).into_response());
    }

    let fragments = app.chats.ask_stream(request.chat_id, &request.messages).await?;
    let events = fragments.map(|fragment| {
        Ok::<_, Infallible>(match fragment {
            Ok(text) => Event::default().data(text),
            Err(err) => {
                warn!(error = %err, "answer stream failed");
                Event::default().event("error").data(err.to_string())
            }
        })
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()).into_response())
}

async fn messages(
    State(app): State<AppContext>,
    Json(request): Json<MessagesRequest>,
) -> Result<Json<Vec<StoredMessage>>, ApiFailure> {
    Ok(Json(app.chats.messages(request.chat_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_for(&PipelineError::ChatNotFound(Uuid::nil())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&PipelineError::EmptyDocument("k".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(&PipelineError::Generation("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&PipelineError::Storage("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_query_request_accepts_client_messages() {
        let request: QueryRequest = serde_json::from_str(
            r#"{"chatId":"00000000-0000-0000-0000-000000000000",
                "messages":[{"id":"1","role":"user","content":"hi"}]}"#,
        )
        .unwrap();
        assert!(!request.stream);
        assert_eq!(request.messages[0].content, "hi");
    }
}
