//! Result summarization: turn query rows into a short explanation.
//!
//! An empty result never reaches the model: there is nothing to
//! explain, and a model asked to explain nothing will invent something.

use loregraph_core::RowSet;
use loregraph_llm::{CompletionRequest, LanguageModel, LlmError};

/// Fixed interpretation for empty results.
pub const EMPTY_RESULT_INTERPRETATION: &str =
    "No matching relationships were found in the graph for this question.";

const SUMMARY_TEMPERATURE: f32 = 0.3;

const SUMMARY_INSTRUCTIONS: &str = "You explain knowledge-graph query results. Given a question and \
the rows a graph query returned, write a short interpretation (2-4 sentences) of what the rows \
mean. Mention notable entities by name. Do not invent relationships that are not in the rows.";

/// Summarize a result set.
///
/// Zero rows short-circuit to the fixed interpretation with no model
/// call. Otherwise one call, with at most `row_cap` rows serialized into
/// the prompt. Failures propagate; the orchestrator degrades to raw rows.
pub async fn summarize(
    model: &dyn LanguageModel,
    question: &str,
    rows: &RowSet,
    row_cap: usize,
) -> Result<String, LlmError> {
    if rows.is_empty() {
        return Ok(EMPTY_RESULT_INTERPRETATION.to_string());
    }

    let request = CompletionRequest::new(SUMMARY_INSTRUCTIONS, summary_prompt(question, rows, row_cap))
        .with_temperature(SUMMARY_TEMPERATURE);
    let reply = model.complete(request).await?;
    Ok(reply.trim().to_string())
}

fn summary_prompt(question: &str, rows: &RowSet, row_cap: usize) -> String {
    let lines: Vec<String> = rows
        .rows
        .iter()
        .take(row_cap)
        .map(|row| serde_json::Value::Object(row.clone()).to_string())
        .collect();

    let mut prompt = format!(
        "Question: {question}\n\nQuery results ({} rows):\n{}",
        rows.row_count(),
        lines.join("\n")
    );
    if rows.row_count() > row_cap {
        prompt.push_str(&format!("\n... truncated to the first {row_cap} rows."));
    }
    prompt
}
