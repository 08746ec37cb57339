//! loregraph-llm — narrow language-model capability for the pipeline.
//!
//! The pipeline needs exactly two things from a language model: turn a
//! question into a query candidate, and turn result rows into prose. Both
//! go through the single `LanguageModel::complete` call defined here.
//! Prompt construction lives in the pipeline crate; retry policy lives in
//! the orchestrator. Tests substitute deterministic fakes for this trait,
//! so nothing downstream ever needs a live service.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openai::{OpenAiChatModel, OpenAiConfig};

/// Errors from a language-model call.
///
/// All variants are upstream-service failures; the orchestrator retries
/// them a bounded number of times before giving up.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Language-model request timed out")]
    Timeout,

    #[error("Language-model service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed language-model response: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// One completion request: task instructions plus user content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Sampling temperature; 0.0 for deterministic query translation.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.0,
            max_tokens: 512,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Narrow capability interface over an external language model.
///
/// Implementations make exactly one outbound call per `complete`
/// invocation. The response is free text and is never assumed to be
/// syntactically valid; generated queries pass through the validator
/// before anything executes them.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
