//! loregraph-ask: natural-language question answering over the lore graph.
//!
//! Turns a free-text question into a validated Cypher query, executes it
//! against the graph store, and explains the rows. Canonical questions
//! short-circuit generation entirely; generated candidates loop through
//! validate/repair a bounded number of times; store failures are recorded
//! for vocabulary-grounding review and never retried.
//!
//! Requests are stateless and independent: the vocabulary and canonical
//! bank are read-only after construction, so any number of `ask` calls
//! may run concurrently without synchronization. Dropping the returned
//! future at an await point abandons the request cleanly; all repair
//! state is request-local.

pub mod canonical;
pub mod config;
pub mod error;
pub mod executor;
pub mod generate;
pub mod repair;
pub mod summarize;
pub mod trace;
pub mod validate;
pub mod vocabulary;

pub use config::AskConfig;
pub use error::PipelineError;
pub use executor::{ExecError, QueryExecutor};

use std::sync::Arc;
use std::time::{Duration, Instant};

use loregraph_core::{Answer, QueryCandidate, RowSet, ValidationReport};
use loregraph_llm::LanguageModel;
use loregraph_trace::session::TraceSession;

use crate::canonical::CanonicalBank;
use crate::vocabulary::SchemaVocabulary;

/// Stages of the per-request state machine.
///
/// Each stage owns exactly the data its transition needs; the `loop` in
/// [`AskEngine::run`] drives transitions until the request finishes or a
/// terminal error is returned. The explicit enum keeps the retry and
/// repair bounds checkable at a glance.
enum Stage {
    Intake,
    Generate {
        attempt: u32,
    },
    Validate {
        candidate: QueryCandidate,
    },
    Repair {
        candidate: QueryCandidate,
        report: ValidationReport,
    },
    Execute {
        candidate: QueryCandidate,
        /// Interpretation to use verbatim (canonical hits); `None` means
        /// the summarizer runs after execution.
        interpretation: Option<String>,
    },
    Summarize {
        rows: RowSet,
    },
    Done {
        rows: RowSet,
        interpretation: Option<String>,
    },
}

/// The question-answering engine.
///
/// Holds the read-only vocabulary and canonical bank plus the two
/// external collaborators behind narrow trait objects, so tests can
/// substitute deterministic fakes for both.
pub struct AskEngine {
    executor: Arc<dyn QueryExecutor>,
    model: Arc<dyn LanguageModel>,
    vocabulary: SchemaVocabulary,
    bank: CanonicalBank,
    config: AskConfig,
}

impl AskEngine {
    /// Create an engine with default limits.
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        model: Arc<dyn LanguageModel>,
        vocabulary: SchemaVocabulary,
        bank: CanonicalBank,
    ) -> Self {
        Self {
            executor,
            model,
            vocabulary,
            bank,
            config: AskConfig::default(),
        }
    }

    /// Override the pipeline limits and paths.
    pub fn with_config(mut self, config: AskConfig) -> Self {
        self.config = config;
        self
    }

    /// Answer one question.
    ///
    /// Never fails silently: every failure comes back as a `Failed`
    /// answer with a category and a human-readable message, and never
    /// with the internal query text.
    pub async fn ask(&self, question: &str) -> Answer {
        let start = Instant::now();
        let question = question.trim();
        let mut session = trace::start_ask_session(question);

        let result = self.run(question, &mut session).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let mut answer = match result {
            Ok((rows, interpretation)) => {
                session.set_outcome("ok", None, Some(rows.row_count()));
                Answer::ok(rows, interpretation, elapsed_ms)
            }
            Err(e) => {
                let kind = e.failure_kind();
                tracing::warn!(error = %e, kind = kind.as_str(), "Question failed");
                session.set_outcome("failed", Some(kind.as_str()), None);
                Answer::failed(kind, e.user_message(), elapsed_ms)
            }
        };

        if let Some(dir) = &self.config.trace_dir {
            answer.trace_id =
                trace::finalize_and_store(session, dir).map(|t| t.id.to_string());
        }

        answer
    }

    /// Drive the state machine for one request.
    async fn run(
        &self,
        question: &str,
        session: &mut TraceSession,
    ) -> error::Result<(RowSet, Option<String>)> {
        let mut stage = Stage::Intake;

        loop {
            stage = match stage {
                Stage::Intake => match self.bank.lookup(question) {
                    Some(entry) => {
                        tracing::info!(pattern = %entry.pattern, "Canonical hit; skipping generation");
                        trace::record_stage(session, "intake", "canonical pattern matched");
                        Stage::Execute {
                            candidate: QueryCandidate::canonical(entry.query.clone()),
                            interpretation: Some(entry.interpretation.clone()),
                        }
                    }
                    None => {
                        trace::record_stage(session, "intake", "no canonical match; generating");
                        Stage::Generate { attempt: 1 }
                    }
                },

                Stage::Generate { attempt } => {
                    match generate::generate(self.model.as_ref(), question, &self.vocabulary).await
                    {
                        Ok(candidate) => {
                            trace::record_stage(
                                session,
                                "generate",
                                &format!("candidate produced on attempt {attempt}"),
                            );
                            Stage::Validate { candidate }
                        }
                        Err(e) if attempt < self.config.max_generation_attempts => {
                            tracing::warn!(attempt, error = %e, "Generation attempt failed; retrying");
                            trace::record_stage(
                                session,
                                "generate",
                                &format!("attempt {attempt} failed: {e}"),
                            );
                            tokio::time::sleep(self.backoff(attempt)).await;
                            Stage::Generate {
                                attempt: attempt + 1,
                            }
                        }
                        Err(e) => {
                            trace::record_stage(
                                session,
                                "generate",
                                &format!("attempt {attempt} failed: {e}"),
                            );
                            return Err(PipelineError::GenerationUnavailable {
                                attempts: attempt,
                                last_error: e.to_string(),
                            });
                        }
                    }
                }

                Stage::Validate { candidate } => {
                    let report = validate::validate(&candidate, &self.vocabulary);
                    trace::record_candidate(session, &candidate, &report);
                    if report.is_valid() {
                        Stage::Execute {
                            candidate,
                            interpretation: None,
                        }
                    } else {
                        tracing::debug!(
                            unknown = ?report.unknown_tokens,
                            unbound = ?report.unbound_variables,
                            "Candidate failed validation"
                        );
                        Stage::Repair { candidate, report }
                    }
                }

                Stage::Repair { candidate, report } => {
                    if candidate.repair_attempts >= self.config.max_repair_cycles {
                        trace::record_stage(session, "repair", "repair bound exhausted");
                        return Err(PipelineError::Unrepairable {
                            repair_attempts: candidate.repair_attempts,
                        });
                    }
                    match repair::repair(&candidate, &report, &self.vocabulary) {
                        Some(repaired) => {
                            trace::record_stage(session, "repair", "candidate rewritten");
                            Stage::Validate { candidate: repaired }
                        }
                        None => {
                            trace::record_stage(
                                session,
                                "repair",
                                "repair declined: no unique vocabulary match",
                            );
                            return Err(PipelineError::Unrepairable {
                                repair_attempts: candidate.repair_attempts,
                            });
                        }
                    }
                }

                Stage::Execute {
                    candidate,
                    interpretation,
                } => {
                    let rows = self.execute(&candidate, session).await?;
                    match interpretation {
                        Some(text) => Stage::Done {
                            rows,
                            interpretation: Some(text),
                        },
                        None => Stage::Summarize { rows },
                    }
                }

                Stage::Summarize { rows } => {
                    let interpretation = match summarize::summarize(
                        self.model.as_ref(),
                        question,
                        &rows,
                        self.config.summary_row_cap,
                    )
                    .await
                    {
                        Ok(text) => {
                            trace::record_stage(session, "summarize", "interpretation produced");
                            Some(text)
                        }
                        Err(e) => {
                            // Degraded outcome: the rows still go back.
                            tracing::warn!(error = %e, "Summarization failed; returning rows without prose");
                            trace::record_stage(session, "summarize", &format!("degraded: {e}"));
                            None
                        }
                    };
                    Stage::Done {
                        rows,
                        interpretation,
                    }
                }

                Stage::Done {
                    rows,
                    interpretation,
                } => return Ok((rows, interpretation)),
            };
        }
    }

    /// Execute a candidate with the store-side timeout. Store failures
    /// are logged with the offending query and never retried.
    async fn execute(
        &self,
        candidate: &QueryCandidate,
        session: &mut TraceSession,
    ) -> error::Result<RowSet> {
        let timeout = Duration::from_secs(self.config.execution_timeout_secs);

        match tokio::time::timeout(timeout, self.executor.execute(&candidate.text)).await {
            Ok(Ok(rows)) => {
                trace::record_stage(
                    session,
                    "execute",
                    &format!("{} rows returned", rows.row_count()),
                );
                Ok(rows)
            }
            Ok(Err(e)) => {
                tracing::error!(
                    category = %e.category,
                    query = %candidate.text,
                    error = %e.message,
                    "Store rejected query"
                );
                trace::record_stage(
                    session,
                    "execute",
                    &format!("store error ({}): {}", e.category, e.message),
                );
                Err(PipelineError::Execution {
                    category: e.category,
                    message: e.message,
                    query: candidate.text.clone(),
                })
            }
            Err(_) => {
                tracing::error!(
                    query = %candidate.text,
                    timeout_secs = self.config.execution_timeout_secs,
                    "Execution timed out"
                );
                trace::record_stage(session, "execute", "execution timed out");
                Err(PipelineError::Execution {
                    category: loregraph_graph::ErrorCategory::Connectivity,
                    message: format!(
                        "execution exceeded {}s timeout",
                        self.config.execution_timeout_secs
                    ),
                    query: candidate.text.clone(),
                })
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.config.retry_backoff_ms.saturating_mul(factor))
    }
}
