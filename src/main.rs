mod agent;
mod cli;
mod config;
mod errors;
mod memory;
mod models;
mod rag;
mod routes;
mod service;

use std::sync::Arc;

use tokio::io::BufReader;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agent::OllamaAgentService;
use crate::config::AppConfig;
use crate::memory::ChatMemory;
use crate::routes::rag_router;
use crate::service::rag_chat_service::{RagChatService, RetrievalSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Initialise tracing; the terminal chat keeps stdout to itself
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_chat=debug,tower_http=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Documents ─────────────────────────────────────────────────────────────
    let agent = OllamaAgentService::new(&config.ollama_base_url, &config.ollama_model)?;
    let embedder = agent.embedding_model(&config.ollama_embedding_model);
    let store = rag::build_document_store(&config, embedder).await?;

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let memory = ChatMemory::new(config.memory_max_messages);
    let rag_service = RagChatService::new(
        agent,
        Arc::new(store),
        Arc::new(memory),
        RetrievalSettings {
            top_k: config.top_k,
            similarity_threshold: config.similarity_threshold,
        },
    );

    if config.cli_enabled {
        let svc = rag_service.clone();
        let filter = config.cli_filter_expression.clone();
        tokio::spawn(async move {
            let input = BufReader::new(tokio::io::stdin());
            match cli::run_session(&svc, filter.as_deref(), input, tokio::io::stdout()).await {
                Ok(()) => info!("CLI session ended"),
                Err(e) => error!("CLI session failed: {e}"),
            }
        });
    }

    // ── Router ────────────────────────────────────────────────────────────────
    let app = rag_router(rag_service)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Listening on http://{addr}/ (model {}, embeddings {} at {}, static files from {})",
        config.ollama_model,
        config.ollama_embedding_model,
        config.ollama_base_url,
        config.static_dir.display()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
