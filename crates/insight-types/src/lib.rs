pub mod analysis;
pub mod dataset;
pub mod quota;

pub use analysis::{AnalysisRequest, AnalysisResult, Visualization, VisualizationKind};
pub use dataset::{DatasetDescriptor, DatasetId, DatasetSummary, Row, UnknownDataset};
pub use quota::{QueryQuota, QuotaPolicy, QuotaStatus, DEFAULT_QUERY_LIMIT, DEFAULT_WINDOW_HOURS};
