use std::fmt::Write;

use insight_types::DatasetDescriptor;

pub const SYSTEM_PROMPT: &str = "You are a conversational data analysis assistant. \
You help users understand their data through natural language conversations.

Key capabilities:
- Analyze patterns and trends in datasets
- Perform statistical analysis
- Answer specific questions about data
- Suggest visualizations and insights
- Provide clear, actionable conclusions

Always structure your responses with:
1. Direct answer to the question
2. Supporting data analysis
3. Key insights or patterns found
4. Suggested next steps or questions

Be conversational, insightful, and data-driven in your responses.";

const TRUNCATION_MARKER: &str = "\n... (sample truncated)";

/// Shapes the dataset into a bounded prompt
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    pub sample_rows: usize,
    pub max_sample_chars: usize,
}

impl ContextBuilder {
    pub fn new(sample_rows: usize, max_sample_chars: usize) -> Self {
        Self {
            sample_rows,
            max_sample_chars,
        }
    }

    pub fn build(&self, descriptor: &DatasetDescriptor, query: &str) -> String {
        let mut context = String::new();
        let _ = writeln!(context, "Dataset: {}", descriptor.id);
        let _ = writeln!(context, "Description: {}", descriptor.description);
        let _ = writeln!(context, "Total records: {}", descriptor.row_count());

        if descriptor.is_empty() {
            context.push_str("The dataset is currently empty: there are no records to sample.\n");
        } else {
            let _ = writeln!(context, "Sample data structure: {}", self.sample(descriptor));
        }

        let columns = if descriptor.columns.is_empty() {
            "(none)".to_string()
        } else {
            descriptor.columns.join(", ")
        };
        let _ = writeln!(context, "\nAvailable columns: {}", columns);

        context.push_str(
            "\nAnalyze this dataset and provide:\n\
             1. Direct answers to the user's question\n\
             2. Relevant data insights and patterns\n\
             3. Statistical summaries when appropriate\n\
             4. Suggested follow-up questions\n",
        );
        let _ = write!(context, "\nUser query: {}", query);
        context
    }

    fn sample(&self, descriptor: &DatasetDescriptor) -> String {
        let take = self.sample_rows.min(descriptor.row_count());
        let sample = &descriptor.rows[..take];
        let rendered = serde_json::to_string_pretty(sample).unwrap_or_else(|_| "[]".to_string());
        truncate_chars(&rendered, self.max_sample_chars)
    }
}

/// Cut `s` to at most `max` characters, marking the cut
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}{}", &s[..byte_idx], TRUNCATION_MARKER),
    }
}
