use axum::{extract::State, Json};
use std::sync::Arc;

use insight_types::DatasetSummary;

use crate::state::AppState;

/// List the datasets callers can query
#[utoipa::path(
    get,
    path = "/datasets",
    responses(
        (status = 200, description = "Available datasets", body = Vec<DatasetSummary>)
    ),
    tag = "analysis"
)]
pub async fn list_datasets(State(state): State<Arc<AppState>>) -> Json<Vec<DatasetSummary>> {
    Json(state.relay.datasets())
}
