use serde::{Deserialize, Serialize};

use crate::dataset::Row;

/// Incoming analysis request as sent by the chat UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub user_id: String,
}

impl AnalysisRequest {
    pub fn new(
        query: impl Into<String>,
        dataset: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            dataset: dataset.into(),
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum VisualizationKind {
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Visualization {
    #[serde(rename = "type")]
    pub kind: VisualizationKind,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Object>))]
    pub data: Vec<Row>,
}

/// Narrative answer plus the excerpt of rows that backs it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalysisResult {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<Object>>))]
    pub table: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
}

impl AnalysisResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            table: None,
            visualization: None,
        }
    }

    /// Attach a row excerpt, rendered as a table
    pub fn with_table(mut self, rows: Vec<Row>) -> Self {
        self.visualization = Some(Visualization {
            kind: VisualizationKind::Table,
            data: rows.clone(),
        });
        self.table = Some(rows);
        self
    }
}
