use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single record: column name -> value
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid dataset selected: {0}")]
pub struct UnknownDataset(pub String);

/// The closed set of datasets the relay can analyze.
///
/// Every identifier maps to exactly one backing table; `Pokemon` additionally
/// joins the battle records table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DatasetId {
    #[serde(rename = "pokemon")]
    Pokemon,
    #[serde(rename = "CustomerExperience")]
    CustomerExperience,
    #[serde(rename = "SuccessEducationBackground")]
    SuccessEducationBackground,
}

impl DatasetId {
    pub const ALL: [DatasetId; 3] = [
        DatasetId::Pokemon,
        DatasetId::CustomerExperience,
        DatasetId::SuccessEducationBackground,
    ];

    /// Wire identifier used by callers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pokemon => "pokemon",
            Self::CustomerExperience => "CustomerExperience",
            Self::SuccessEducationBackground => "SuccessEducationBackground",
        }
    }

    /// Name of the primary backing table
    pub fn table(&self) -> &'static str {
        match self {
            Self::Pokemon => "PokemonData",
            Self::CustomerExperience => "CustomerExperience",
            Self::SuccessEducationBackground => "SuccessEducationBackground",
        }
    }

    /// Secondary table joined into the row set, if any
    pub fn joined_table(&self) -> Option<&'static str> {
        match self {
            Self::Pokemon => Some("Pokemon_BattleTable"),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pokemon => {
                "Pokémon dataset with stats including HP, Attack, Defense, types, and battle data"
            }
            Self::CustomerExperience => {
                "Customer Experience dataset with satisfaction scores, demographics, and retention data"
            }
            Self::SuccessEducationBackground => {
                "Education and Success dataset with degree information, institutions, and career outcomes"
            }
        }
    }

    pub fn sample_questions(&self) -> &'static [&'static str] {
        match self {
            Self::Pokemon => &[
                "Which Pokemon has the highest attack stat?",
                "Show me all legendary Pokemon and their stats",
                "Compare different Pokemon types by average stats",
                "What are the strongest Pokemon from Generation 1?",
                "Which Pokemon type combination is most effective?",
            ],
            Self::CustomerExperience => &[
                "What is the average satisfaction score by location?",
                "Show me customers with high retention rates",
                "Which demographics have the lowest satisfaction scores?",
                "Compare satisfaction scores across different age groups",
                "What's the correlation between time spent and purchases?",
            ],
            Self::SuccessEducationBackground => &[
                "What are the most common degrees among successful people?",
                "Show me the top universities by success rate",
                "Compare success metrics across different fields",
                "What's the average GPA of successful professionals?",
                "Which countries produce the most successful graduates?",
            ],
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetId {
    type Err = UnknownDataset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownDataset(s.to_string()))
    }
}

/// A resolved dataset: rows plus the description used for prompt context
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    pub id: DatasetId,
    pub description: String,
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
}

impl DatasetDescriptor {
    pub fn new(id: DatasetId, rows: Vec<Row>) -> Self {
        let columns = collect_columns(&rows);
        Self {
            id,
            description: id.description().to_string(),
            rows,
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column names in first-seen order across all rows
fn collect_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Listing entry for the dataset catalogue endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub description: String,
    pub sample_questions: Vec<String>,
}

impl From<DatasetId> for DatasetSummary {
    fn from(id: DatasetId) -> Self {
        Self {
            id,
            description: id.description().to_string(),
            sample_questions: id.sample_questions().iter().map(|q| q.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_known_identifiers() {
        for id in DatasetId::ALL {
            assert_eq!(id.as_str().parse::<DatasetId>().unwrap(), id);
        }
    }

    #[test]
    fn test_parse_unknown_identifier() {
        let err = "not-a-real-dataset".parse::<DatasetId>().unwrap_err();
        assert_eq!(err, UnknownDataset("not-a-real-dataset".to_string()));
    }

    #[test]
    fn test_identifiers_are_case_sensitive() {
        assert!("Pokemon".parse::<DatasetId>().is_err());
        assert!("customerexperience".parse::<DatasetId>().is_err());
    }

    #[test]
    fn test_only_pokemon_joins() {
        assert_eq!(DatasetId::Pokemon.joined_table(), Some("Pokemon_BattleTable"));
        assert_eq!(DatasetId::CustomerExperience.joined_table(), None);
        assert_eq!(DatasetId::SuccessEducationBackground.joined_table(), None);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&DatasetId::Pokemon).unwrap();
        assert_eq!(json, "\"pokemon\"");
        let id: DatasetId = serde_json::from_str("\"CustomerExperience\"").unwrap();
        assert_eq!(id, DatasetId::CustomerExperience);
    }

    #[test]
    fn test_descriptor_columns_union() {
        let rows = vec![
            row(json!({"Name": "Bulbasaur", "HP": 45})),
            row(json!({"Name": "Mew", "Legendary": true})),
        ];
        let descriptor = DatasetDescriptor::new(DatasetId::Pokemon, rows);

        assert_eq!(descriptor.row_count(), 2);
        assert_eq!(descriptor.columns.len(), 3);
        assert!(descriptor.columns.contains(&"Legendary".to_string()));
    }

    #[test]
    fn test_empty_descriptor() {
        let descriptor = DatasetDescriptor::new(DatasetId::CustomerExperience, vec![]);
        assert!(descriptor.is_empty());
        assert!(descriptor.columns.is_empty());
        assert_eq!(descriptor.description, DatasetId::CustomerExperience.description());
    }
}
