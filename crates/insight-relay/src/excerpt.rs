//! Row excerpt selection.
//!
//! This is a keyword heuristic, not a query language: each rule ties one
//! keyword in the question to one predicate on one dataset. Without a match
//! the excerpt is the first rows in source order.

use serde_json::Value;

use insight_types::{DatasetId, Row};

pub struct ExcerptRule {
    pub dataset: DatasetId,
    /// Lower-case keyword looked up in the lower-cased query
    pub keyword: &'static str,
    pub predicate: fn(&Row) -> bool,
}

pub const EXCERPT_RULES: &[ExcerptRule] = &[
    ExcerptRule {
        dataset: DatasetId::Pokemon,
        keyword: "legendary",
        predicate: is_legendary,
    },
    ExcerptRule {
        dataset: DatasetId::CustomerExperience,
        keyword: "satisfied",
        predicate: is_satisfied,
    },
    ExcerptRule {
        dataset: DatasetId::SuccessEducationBackground,
        keyword: "phd",
        predicate: has_phd,
    },
];

const SATISFIED_THRESHOLD: f64 = 8.0;

fn is_legendary(row: &Row) -> bool {
    matches!(row.get("Legendary"), Some(Value::Bool(true)))
}

fn is_satisfied(row: &Row) -> bool {
    row.get("Satisfaction_Score")
        .and_then(Value::as_f64)
        .is_some_and(|score| score >= SATISFIED_THRESHOLD)
}

fn has_phd(row: &Row) -> bool {
    row.get("Degree")
        .and_then(Value::as_str)
        .is_some_and(|degree| degree.to_lowercase().contains("phd"))
}

/// First rule for `dataset` whose keyword occurs in `query`
pub fn matching_rule(dataset: DatasetId, query: &str) -> Option<&'static ExcerptRule> {
    let query = query.to_lowercase();
    EXCERPT_RULES
        .iter()
        .find(|rule| rule.dataset == dataset && query.contains(rule.keyword))
}

/// At most `limit` rows relevant to `query`, in source order
pub fn select_excerpt(dataset: DatasetId, query: &str, rows: &[Row], limit: usize) -> Vec<Row> {
    match matching_rule(dataset, query) {
        Some(rule) => rows
            .iter()
            .filter(|row| (rule.predicate)(row))
            .take(limit)
            .cloned()
            .collect(),
        None => rows.iter().take(limit).cloned().collect(),
    }
}
