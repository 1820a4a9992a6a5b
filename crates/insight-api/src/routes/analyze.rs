use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

use insight_types::{AnalysisRequest, AnalysisResult};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Ask a question about one dataset
///
/// Charges one query against the caller's quota, and only when an answer is
/// produced.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Narrative answer with a row excerpt", body = AnalysisResult),
        (status = 400, description = "Invalid dataset or malformed request"),
        (status = 401, description = "Missing caller identity"),
        (status = 429, description = "Daily query limit reached"),
        (status = 502, description = "Inference provider failed"),
        (status = 500, description = "Storage failure")
    ),
    tag = "analysis"
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisResult>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let result = state.relay.analyze(request).await?;
    Ok(Json(result))
}
