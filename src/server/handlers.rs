use axum::{
    Json,
    extract::{
        Multipart, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use super::AppState;
use super::error::ApiError;
use super::types::{HealthResponse, ProcessQuery, ProcessRequest, UploadResponse, parse_tool_list};
use crate::runner::AnalysisReport;
use crate::sample::{Sample, SampleError};
use crate::stegsolve::{self, ImageAnalysis};
use crate::tools::ToolInfo;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "stegproc",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolInfo>> {
    Json(state.runner.tools().iter().map(|t| t.info()).collect())
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn process(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProcessQuery>, QueryRejection>,
    request: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let Json(ProcessRequest {
        key,
        data,
        filename,
        password,
        tools,
    }) = request?;

    let sample = match (key, data) {
        (Some(key), None) => {
            info!("POST /process key={}", key);
            let root = state.config.storage.root.clone();
            stage(move || Sample::from_storage(&root, &key)).await?
        }
        (None, Some(data)) => {
            let name = filename.unwrap_or_default();
            info!("POST /process inline name={:?}", name);
            stage(move || Sample::from_base64(&name, &data)).await?
        }
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "Provide either key or data, not both".to_string(),
            ));
        }
        (None, None) => {
            return Err(ApiError::BadRequest("Missing file key or data".to_string()));
        }
    };

    let report = run(&state, &sample, password, tools).await?;

    Ok(Json(if query.detailed {
        report.to_detailed_json()
    } else {
        report.to_flat_json()
    }))
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut file = None;
    let mut password = None;
    let mut tools = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                file = Some((name, bytes));
            }
            Some("password") => password = Some(field.text().await?),
            Some("tools") => tools = Some(parse_tool_list(&field.text().await?)),
            _ => {}
        }
    }

    let (name, bytes) = file
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No valid file uploaded.".to_string()))?;

    info!("POST /upload name={:?} size={}", name, bytes.len());
    let sample = stage(move || Sample::from_bytes(&name, &bytes)).await?;
    let report = run(&state, &sample, password, tools).await?;

    Ok(Json(UploadResponse {
        filename: report.file.clone(),
        size: report.size,
        results: report.to_flat_json(),
    }))
}

#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn stegsolve(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageAnalysis>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }

        let name = field.file_name().unwrap_or("image").to_string();
        let bytes = field.bytes().await?;
        info!("POST /stegsolve name={:?} size={}", name, bytes.len());

        let analysis = tokio::task::spawn_blocking(move || stegsolve::analyze_image(&name, &bytes))
            .await
            .map_err(|e| ApiError::Internal(format!("Analysis task failed: {e}")))??;

        return Ok(Json(analysis));
    }

    Err(ApiError::BadRequest("No image file provided".to_string()))
}

/// Write the sample to disk off the async workers
async fn stage<F>(write: F) -> Result<Sample, ApiError>
where
    F: FnOnce() -> Result<Sample, SampleError> + Send + 'static,
{
    tokio::task::spawn_blocking(write)
        .await
        .map_err(|e| ApiError::Internal(format!("Staging task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn run(
    state: &AppState,
    sample: &Sample,
    password: Option<String>,
    tools: Option<Vec<String>>,
) -> Result<AnalysisReport, ApiError> {
    let password = password.unwrap_or_else(|| state.runner.default_password().to_string());

    state
        .runner
        .run_battery(sample, &password, tools.as_deref())
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}
