pub mod analyze;
pub mod datasets;
pub mod health;
pub mod quota;

use utoipa::OpenApi;

use insight_types::{
    AnalysisRequest, AnalysisResult, DatasetId, DatasetSummary, QuotaStatus, Visualization,
    VisualizationKind,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        analyze::analyze,
        datasets::list_datasets,
        quota::get_quota,
    ),
    components(schemas(
        health::HealthResponse,
        AnalysisRequest,
        AnalysisResult,
        Visualization,
        VisualizationKind,
        DatasetId,
        DatasetSummary,
        QuotaStatus,
    )),
    tags(
        (name = "analysis", description = "Quota-gated dataset analysis"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;
