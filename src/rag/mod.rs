pub mod augmenter;
pub mod filter;
pub mod loader;
pub mod splitter;
pub mod store;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::rag::splitter::LengthTextSplitter;
use crate::rag::store::{DocumentStore, Embedder};

/// Load → split → embed. Runs once at startup.
pub async fn build_document_store<E: Embedder>(
    config: &AppConfig,
    model: E,
) -> Result<DocumentStore<E>, AppError> {
    let splitter = LengthTextSplitter::new(config.chunk_size, config.chunk_overlap)?;
    let documents = loader::load_documents(&config.documents_dir).await?;
    let source_count = documents.len();
    let chunks = splitter.split_documents(documents);

    let mut store = DocumentStore::new(model);
    store.add(chunks).await?;
    info!(
        "Indexed {} chunks from {source_count} documents in {}",
        store.len(),
        config.documents_dir.display()
    );
    if store.is_empty() {
        warn!("No documents indexed; every query will be answered as out of context");
    }
    Ok(store)
}
