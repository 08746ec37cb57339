//! Configuration for the loregraph-ask pipeline.

use serde::Deserialize;

/// Pipeline configuration.
///
/// Loaded from `loregraph.toml` `[ask]` section or `LOREGRAPH_ASK__`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AskConfig {
    /// Path to the schema vocabulary JSON; builtin vocabulary if unset.
    #[serde(default)]
    pub vocabulary_path: Option<String>,

    /// Path to the canonical question bank JSON; builtin bank if unset.
    #[serde(default)]
    pub canonical_path: Option<String>,

    /// Generation attempts before giving up on the model.
    #[serde(default = "default_generation_attempts")]
    pub max_generation_attempts: u32,

    /// Repair cycles before a candidate is declared unrepairable.
    #[serde(default = "default_repair_cycles")]
    pub max_repair_cycles: u32,

    /// Rows included in the summarization prompt.
    #[serde(default = "default_summary_row_cap")]
    pub summary_row_cap: usize,

    /// Graph execution timeout in seconds. Deliberately longer than the
    /// model timeout: graph traversals are the slow path.
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_secs: u64,

    /// Base backoff between generation retries, in milliseconds. Doubles
    /// per attempt.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Directory for trace storage; tracing disabled if unset.
    #[serde(default)]
    pub trace_dir: Option<String>,
}

fn default_generation_attempts() -> u32 {
    2
}

fn default_repair_cycles() -> u32 {
    2
}

fn default_summary_row_cap() -> usize {
    30
}

fn default_execution_timeout() -> u64 {
    60
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            vocabulary_path: None,
            canonical_path: None,
            max_generation_attempts: default_generation_attempts(),
            max_repair_cycles: default_repair_cycles(),
            summary_row_cap: default_summary_row_cap(),
            execution_timeout_secs: default_execution_timeout(),
            retry_backoff_ms: default_backoff_ms(),
            trace_dir: None,
        }
    }
}
