//! ragchat - terminal chat with a local LLM
//!
//! Answers questions through an OpenAI-compatible endpoint (Ollama by
//! default), optionally augmented with:
//! - a Qdrant knowledge base that also remembers every exchange
//! - a static knowledge snippet read at startup
//! - scraped web search results

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use ragchat::chat::Theme;
use ragchat::config::{self, Config};
use ragchat::knowledge::{self, QdrantStore, VectorStore};
use ragchat::llm::{embeddings, CompletionClient};
use ragchat::rag::RagPipeline;
use ragchat::repl::{self, colors, StatusInfo};
use ragchat::session::{ChatSession, SendOutcome};
use ragchat::tools::web::SearchEngine;

#[derive(Parser)]
#[command(name = "ragchat", version)]
#[command(about = "Chat with a local LLM, backed by a Qdrant knowledge base and web search")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ~/.ragchat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true, env = "RAGCHAT_LLM_URL")]
    llm_url: Option<String>,

    /// Chat model name
    #[arg(long, global = true, env = "RAGCHAT_MODEL")]
    model: Option<String>,

    /// Value of the Authorization header
    #[arg(long, global = true, env = "RAGCHAT_API_KEY")]
    api_key: Option<String>,

    /// Embedding model (zero vectors when unset)
    #[arg(long, global = true, env = "RAGCHAT_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Qdrant URL
    #[arg(long, global = true, env = "QDRANT_URL")]
    qdrant_url: Option<String>,

    /// Qdrant collection
    #[arg(long, global = true, env = "RAGCHAT_COLLECTION")]
    collection: Option<String>,

    /// Skip the Qdrant knowledge base entirely
    #[arg(long, global = true)]
    no_vector_store: bool,

    /// Search engine to scrape
    #[arg(long, global = true, value_enum)]
    web_search: Option<SearchEngine>,

    /// Knowledge snippet file read once at startup
    #[arg(long, global = true)]
    knowledge_file: Option<PathBuf>,

    /// Start in dark mode
    #[arg(long, global = true)]
    dark: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Serve the chat over HTTP
    Serve {
        #[arg(long, default_value = "3000")]
        port: u16,
    },
    /// Load a text file into the knowledge base, one record per paragraph
    Ingest { file: PathBuf },
    /// Check that the configured services are reachable
    Doctor,
}

impl Args {
    /// CLI args > env vars (handled by clap) > config file > defaults
    fn apply(&self, config: &mut Config) {
        if let Some(v) = &self.llm_url {
            config.llm_url = v.clone();
        }
        if let Some(v) = &self.model {
            config.llm_model = v.clone();
        }
        if let Some(v) = &self.api_key {
            config.llm_api_key = v.clone();
        }
        if let Some(v) = &self.embedding_model {
            config.embedding_model = Some(v.clone());
        }
        if let Some(v) = &self.qdrant_url {
            config.qdrant_url = v.clone();
        }
        if let Some(v) = &self.collection {
            config.collection = v.clone();
        }
        if self.no_vector_store {
            config.vector_store = false;
        }
        if let Some(v) = self.web_search {
            config.web_search = v;
        }
        if let Some(v) = &self.knowledge_file {
            config.knowledge_file = Some(v.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from ~/.ragchat/.env or current dir)
    let env_path = Some(config::config_dir().join(".env")).filter(|p| p.exists());
    if let Some(path) = env_path {
        let _ = dotenvy::from_path(&path);
    } else {
        let _ = dotenvy::dotenv();
    }

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    args.apply(&mut config);

    let theme = if args.dark { Theme::Dark } else { Theme::Light };

    match args.command.as_ref().unwrap_or(&Commands::Chat) {
        Commands::Chat => {
            let (session, status) = build_session(&config, theme, true).await?;
            repl::Repl::new(session, status)?.run().await
        }
        Commands::Ask { question } => {
            let (mut session, _) = build_session(&config, theme, false).await?;
            match session.send(&question.join(" ")).await {
                SendOutcome::Replied(reply) => println!("{}", reply.text),
                SendOutcome::Ignored => eprintln!("{}", colors::warning("Nothing to ask.")),
                SendOutcome::Busy => {}
            }
            Ok(())
        }
        Commands::Serve { port } => {
            let (session, _) = build_session(&config, theme, true).await?;
            ragchat::server::run(*port, session).await
        }
        Commands::Ingest { file } => ingest(&config, file).await,
        Commands::Doctor => doctor(&config).await,
    }
}

async fn build_session(config: &Config, theme: Theme, banner: bool) -> Result<(ChatSession, StatusInfo)> {
    let pipeline = RagPipeline::from_config(config)?;

    let knowledge = match pipeline.store() {
        Some(store) => match pipeline.prepare().await {
            Ok(()) => colors::success(&store.describe()),
            Err(e) => {
                tracing::warn!("Knowledge base init failed: {:#}", e);
                colors::error(&format!("{} (unavailable)", store.describe()))
            }
        },
        None => colors::warning("disabled"),
    };
    let knowledge = if pipeline.has_snippet() {
        format!("{} + snippet", knowledge)
    } else {
        knowledge
    };

    let status = StatusInfo {
        model: format!("{} @ {}", pipeline.model_name(), config.llm_url),
        knowledge,
        web_search: if pipeline.has_web_search() {
            colors::success(config.web_search.name())
        } else {
            colors::warning("off")
        },
    };

    if banner {
        println!();
        println!("{}", colors::banner_accent(&format!("  ragchat {}", env!("CARGO_PKG_VERSION"))));
        println!("{}", colors::separator(50));
        println!("{}", colors::banner_line("Model", &status.model));
        println!("{}", colors::banner_line("Knowledge", &status.knowledge));
        println!("{}", colors::banner_line("Web search", &status.web_search));
        println!("{}", colors::banner_line("Theme", theme.as_str()));
        println!("{}", colors::separator(50));
        println!();
    }

    let session = ChatSession::new(Arc::new(pipeline)).with_theme(theme);
    Ok((session, status))
}

async fn ingest(config: &Config, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if config.embedding_model.is_none() {
        println!(
            "{}",
            colors::warning("No embedding model configured; records will be stored with zero vectors")
        );
    }

    let store = QdrantStore::from_config(config)?;
    let embedder = embeddings::from_config(config)?;

    let count = knowledge::ingest(&store, embedder.as_ref(), &text).await?;
    println!(
        "{}",
        colors::success(&format!("Stored {} records in {}", count, store.describe()))
    );
    Ok(())
}

async fn doctor(config: &Config) -> Result<()> {
    let llm = CompletionClient::from_config(config)?;
    match llm.list_models().await {
        Ok(models) => {
            let found = models.iter().any(|m| m == &config.llm_model);
            let detail = if found {
                colors::success(&format!("{} available", config.llm_model))
            } else {
                colors::warning(&format!("{} not listed ({} models)", config.llm_model, models.len()))
            };
            println!("{}", colors::banner_line("LLM", &detail));
        }
        Err(e) => println!("{}", colors::banner_line("LLM", &colors::error(&e.to_string()))),
    }

    if config.vector_store {
        let store = QdrantStore::from_config(config)?;
        let detail = match store.ensure_collection().await {
            Ok(()) => colors::success(&store.describe()),
            Err(e) => colors::error(&format!("{:#}", e)),
        };
        println!("{}", colors::banner_line("Qdrant", &detail));
    } else {
        println!("{}", colors::banner_line("Qdrant", &colors::warning("disabled")));
    }

    println!(
        "{}",
        colors::banner_line("Web search", &colors::status(config.web_search.name()))
    );
    Ok(())
}
