use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use insight_types::QuotaStatus;

use crate::{error::ApiResult, state::AppState};

/// Remaining queries for a caller in the current window
#[utoipa::path(
    get,
    path = "/quota/{user_id}",
    params(
        ("user_id" = String, Path, description = "Caller identity")
    ),
    responses(
        (status = 200, description = "Current usage", body = QuotaStatus),
        (status = 401, description = "Missing caller identity")
    ),
    tag = "analysis"
)]
pub async fn get_quota(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<QuotaStatus>> {
    let status = state.relay.quota_status(&user_id).await?;
    Ok(Json(status))
}
