use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::worker::IngestJob;
use super::AppState;
use crate::ingest::source_id_from_name;
use crate::retriever::DEFAULT_K;
use crate::types::{FeedbackRecord, RetrievedChunk};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    DEFAULT_K
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub documents: Vec<RetrievedChunk>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub query_id: String,
    pub feedback: String,
    pub rating: i32,
}

/// Internal failures become a 5xx with a readable message; nothing about the
/// failure site leaks to the client beyond the error's own display text.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

impl From<crate::error::Error> for ApiError {
    fn from(err: crate::error::Error) -> Self {
        ApiError::internal(err.to_string())
    }
}

pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    counter!("doclens_queries_total").increment(1);
    let sources = state
        .retriever
        .retrieve(&request.query, request.k.max(1))
        .await
        .inspect_err(|err| error!(%err, "retrieval failed"))?;
    let answer = state
        .generator
        .generate(&request.query, &sources)
        .await
        .inspect_err(|err| error!(%err, "generation failed"))?;

    Ok(Json(QueryResponse { answer, sources }))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    counter!("doclens_retrievals_total").increment(1);
    let documents = state
        .retriever
        .retrieve(&request.query, request.k.max(1))
        .await
        .inspect_err(|err| error!(%err, "retrieval failed"))?;
    Ok(Json(RetrieveResponse { documents }))
}

/// Accepts the upload, queues it, and acknowledges immediately. The actual
/// ingestion happens on the worker; its outcome is visible in logs and
/// metrics only.
pub async fn ingest(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("failed to read upload: {err}")))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::bad_request("no file field in upload"));
    };

    let job = IngestJob {
        job_id: Uuid::new_v4(),
        source_id: source_id_from_name(&filename),
        filename: filename.clone(),
        bytes,
    };
    let job_id = job.job_id;
    state
        .jobs
        .send(job)
        .await
        .map_err(|_| ApiError::internal("ingestion queue is not accepting jobs"))?;

    info!(%job_id, filename = %filename, "queued upload for ingestion");
    Ok(Json(json!({
        "message": "ingestion started in background",
        "filename": filename,
    })))
}

pub async fn feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = FeedbackRecord {
        timestamp: Utc::now(),
        query_id: request.query_id,
        rating: request.rating,
        feedback: request.feedback,
    };
    state
        .feedback
        .append(&record)
        .await
        .map_err(|err| ApiError::internal(format!("failed to save feedback: {err}")))?;

    counter!("doclens_feedback_total").increment(1);
    Ok(Json(json!({ "status": "received" })))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> String {
    match &state.metrics {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}
