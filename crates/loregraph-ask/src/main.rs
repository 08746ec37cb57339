//! CLI entry point for the loregraph question pipeline.
//!
//! `ask` answers one question and prints the answer as JSON on stdout;
//! logs go to stderr. `check-bank` re-validates a canonical bank against
//! the schema vocabulary; run it whenever a new entry is authored,
//! before the entry ships.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use loregraph_ask::canonical::CanonicalBank;
use loregraph_ask::validate;
use loregraph_ask::vocabulary::SchemaVocabulary;
use loregraph_ask::{AskConfig, AskEngine};
use loregraph_core::QueryCandidate;
use loregraph_graph::{GraphClient, GraphConfig};
use loregraph_llm::{OpenAiChatModel, OpenAiConfig};

#[derive(Parser)]
#[command(name = "loregraph-ask")]
#[command(about = "Natural-language question answering over the lore knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: loregraph).
    #[arg(short, long, default_value = "loregraph", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question against the knowledge graph.
    Ask {
        /// The question text.
        question: String,
    },
    /// Validate a canonical question bank against the schema vocabulary.
    CheckBank {
        /// Bank file to check (defaults to the configured bank).
        #[arg(long)]
        path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let ask_config = load_ask_config(&cli.config)?;

    let vocabulary = match &ask_config.vocabulary_path {
        Some(path) => SchemaVocabulary::load(path)?,
        None => SchemaVocabulary::builtin(),
    };
    tracing::info!(
        relationship_types = vocabulary.relationship_types.len(),
        label = %vocabulary.node_label,
        "Schema vocabulary loaded"
    );

    match cli.command {
        Command::Ask { ref question } => {
            let bank = match &ask_config.canonical_path {
                Some(path) => CanonicalBank::load(path)?,
                None => CanonicalBank::builtin(),
            };
            tracing::info!(entries = bank.len(), "Canonical bank loaded");

            let graph = GraphClient::connect(&load_graph_config(&cli.config)).await?;
            graph.ping().await?;

            let model = OpenAiChatModel::new(load_llm_config(&cli.config))?;

            let engine = AskEngine::new(Arc::new(graph), Arc::new(model), vocabulary, bank)
                .with_config(ask_config);

            let answer = engine.ask(question).await;
            println!("{}", serde_json::to_string(&answer)?);
        }
        Command::CheckBank { ref path } => {
            let bank = match path.as_deref().or(ask_config.canonical_path.as_deref()) {
                Some(p) => CanonicalBank::load(p)?,
                None => CanonicalBank::builtin(),
            };
            check_bank(&vocabulary, &bank)?;
        }
    }

    Ok(())
}

/// Offline validation of every canonical entry, exiting non-zero if any
/// query no longer fits the current vocabulary.
fn check_bank(vocabulary: &SchemaVocabulary, bank: &CanonicalBank) -> anyhow::Result<()> {
    let mut invalid = 0usize;

    for entry in bank.entries() {
        let candidate = QueryCandidate::canonical(entry.query.clone());
        let report = validate::validate(&candidate, vocabulary);
        if report.is_valid() {
            tracing::info!(pattern = %entry.pattern, "Entry OK");
        } else {
            invalid += 1;
            tracing::error!(
                pattern = %entry.pattern,
                unknown = ?report.unknown_tokens,
                unbound = ?report.unbound_variables,
                "Entry failed validation"
            );
        }
    }

    if invalid > 0 {
        anyhow::bail!(
            "{invalid} of {} canonical entries failed validation",
            bank.len()
        );
    }
    println!("All {} canonical entries are valid.", bank.len());
    Ok(())
}

fn load_ask_config(file_prefix: &str) -> anyhow::Result<AskConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("LOREGRAPH_ASK")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<AskConfig>("ask") {
        Ok(c) => Ok(c),
        Err(_) => Ok(AskConfig::default()),
    }
}

fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("LOREGRAPH")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match cfg {
        Ok(c) => GraphConfig {
            uri: c
                .get_string("neo4j.uri")
                .unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: c
                .get_string("neo4j.user")
                .unwrap_or_else(|_| "neo4j".to_string()),
            password: c
                .get_string("neo4j.password")
                .unwrap_or_else(|_| "loregraph-dev".to_string()),
            ..Default::default()
        },
        Err(_) => GraphConfig::default(),
    }
}

fn load_llm_config(file_prefix: &str) -> OpenAiConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("LOREGRAPH")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    let mut llm = match cfg {
        Ok(c) => c.get::<OpenAiConfig>("llm").unwrap_or_default(),
        Err(_) => OpenAiConfig::default(),
    };
    if llm.api_key.is_none() {
        llm.api_key = std::env::var("OPENAI_API_KEY").ok();
    }
    llm
}
