//! Query generation: one grounded language-model call per attempt.
//!
//! The model is grounded with the full vocabulary so it has no excuse to
//! invent relationship types; it still does, which is why everything it
//! returns goes through the validator. Retry policy lives in the
//! orchestrator, not here.

use loregraph_core::QueryCandidate;
use loregraph_llm::{CompletionRequest, LanguageModel, LlmError};

use crate::vocabulary::SchemaVocabulary;

/// Ask the model for a candidate query. Exactly one outbound call.
pub async fn generate(
    model: &dyn LanguageModel,
    question: &str,
    vocabulary: &SchemaVocabulary,
) -> Result<QueryCandidate, LlmError> {
    let request = CompletionRequest::new(grounding_prompt(vocabulary), question);
    let reply = model.complete(request).await?;

    let text = strip_code_fences(&reply);
    if text.is_empty() {
        return Err(LlmError::Malformed("model returned an empty query".to_string()));
    }

    tracing::debug!(chars = text.len(), "Candidate query generated");
    Ok(QueryCandidate::generated(text))
}

/// Build the system prompt grounding the model in the schema vocabulary.
fn grounding_prompt(vocabulary: &SchemaVocabulary) -> String {
    let relation_list = vocabulary
        .relationship_types
        .iter()
        .map(|r| format!("`{r}`"))
        .collect::<Vec<_>>()
        .join(", ");
    let label = &vocabulary.node_label;

    format!(
        "You are a Cypher expert translating natural language into Neo4j Cypher queries.\n\
         \n\
         GRAPH STRUCTURE:\n\
         - Nodes are labeled `{label}` and have an `id` property.\n\
         - Edges use only the following relationship types: {relation_list}\n\
         \n\
         RULES:\n\
         - Use only the relationship types above. Do not invent others.\n\
         - Never use generic relationships like \"related_to\", \"associated_with\", or \"connected_to\".\n\
         - If the question names a specific entity (e.g. \"Black Knights\"), match it exactly:\n\
           MATCH (a:{label} {{id: \"Black Knights\"}})-[:wield]->(b:{label})\n\
         - If the question names a category (e.g. \"shields\"), match it partially:\n\
           MATCH (a:{label})-[r]->(b:{label}) WHERE toLower(a.id) CONTAINS \"shield\"\n\
         - If unsure, fall back to:\n\
           MATCH (a:{label} {{id: \"X\"}})-[r]->(b:{label}) RETURN type(r), b.id\n\
         \n\
         Only return the Cypher query. Do not explain."
    )
}

/// Models often wrap the query in markdown fences; strip them (and a
/// language tag on the opening fence) before validation.
fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    let rest = match rest.split_once('\n') {
        Some((first, body)) if first.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
        _ => rest,
    };
    rest.trim().to_string()
}
