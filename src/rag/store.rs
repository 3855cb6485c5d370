use std::cmp::Ordering;
use std::collections::BTreeMap;

use rig::embeddings::distance::VectorDistance;
use rig::embeddings::{Embed, EmbedError, EmbeddingError, EmbeddingModel, EmbeddingsBuilder, TextEmbedder};
use rig::vector_store::in_memory_store::InMemoryVectorStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::rag::filter::FilterExpression;

/// Embedding models the document store can index with.
pub trait Embedder: EmbeddingModel + Clone + 'static {}

impl<T: EmbeddingModel + Clone + 'static> Embedder for T {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: BTreeMap::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Embed for Document {
    fn embed(&self, embedder: &mut TextEmbedder) -> Result<(), EmbedError> {
        embedder.embed(self.text.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub top_k: usize,
    pub similarity_threshold: f64,
    pub filter: Option<&'a FilterExpression>,
}

fn embedding_error(err: EmbeddingError) -> AppError {
    match err {
        EmbeddingError::HttpError(e) => AppError::EmbeddingUnavailable { message: e.to_string() },
        other => AppError::EmbeddingFailed { message: other.to_string() },
    }
}

/// In-memory vector index over document chunks. Chunks are embedded once when
/// added; each search embeds only the query.
pub struct DocumentStore<E: Embedder> {
    model: E,
    vectors: InMemoryVectorStore<Document>,
}

impl<E: Embedder> DocumentStore<E> {
    pub fn new(model: E) -> Self {
        Self { model, vectors: InMemoryVectorStore::from_documents(Vec::new()) }
    }

    pub async fn add(&mut self, documents: Vec<Document>) -> Result<(), AppError> {
        if documents.is_empty() {
            return Ok(());
        }
        let embedded = EmbeddingsBuilder::new(self.model.clone())
            .documents(documents)
            .map_err(|e| AppError::EmbeddingFailed { message: e.to_string() })?
            .build()
            .await
            .map_err(embedding_error)?;

        self.vectors
            .add_documents_with_ids(embedded.into_iter().map(|(doc, embeddings)| (doc.id.clone(), doc, embeddings)));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Returns up to `top_k` documents whose cosine similarity to the query is at
    /// least the threshold, best first. The filter is applied before ranking.
    pub async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<ScoredDocument>, AppError> {
        if self.vectors.is_empty() || request.top_k == 0 {
            return Ok(Vec::new());
        }
        let query = self.model.embed_text(request.query).await.map_err(embedding_error)?;

        let mut hits: Vec<ScoredDocument> = self
            .vectors
            .iter()
            .filter(|(_, (document, _))| request.filter.is_none_or(|f| f.matches(&document.metadata)))
            .filter_map(|(_, (document, embeddings))| {
                let score = embeddings
                    .iter()
                    .map(|embedding| embedding.cosine_similarity(&query, false))
                    .fold(f64::NAN, f64::max);
                // NaN (zero vectors) never passes the threshold.
                (score >= request.similarity_threshold)
                    .then(|| ScoredDocument { document: document.clone(), score })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        hits.truncate(request.top_k);
        debug!("{} of {} chunks passed retrieval", hits.len(), self.vectors.len());
        Ok(hits)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::topic_store;
    use super::*;

    async fn store() -> DocumentStore<testing::TopicEmbedder> {
        topic_store(vec![
            Document::new("paris", "Paris is the French capital city.").with_metadata("source", "geo.md"),
            Document::new("rust", "Rust has memory safety without a garbage collector.")
                .with_metadata("source", "rust.md"),
            Document::new("mixed", "The Rust compiler team met in Paris.").with_metadata("source", "news.md"),
            Document::new("tea", "Let green tea steep for two minutes.").with_metadata("source", "tea.md"),
        ])
        .await
    }

    fn request<'a>(query: &'a str, filter: Option<&'a FilterExpression>) -> SearchRequest<'a> {
        SearchRequest { query, top_k: 3, similarity_threshold: 0.3, filter }
    }

    fn ids(hits: &[ScoredDocument]) -> Vec<&str> {
        hits.iter().map(|h| h.document.id.as_str()).collect()
    }

    #[tokio::test]
    async fn paraphrased_question_finds_the_matching_chunk() {
        let store = store().await;
        let hits = store
            .search(&request("Which town is the seat of government in France?", None))
            .await
            .unwrap();
        assert_eq!(ids(&hits), vec!["paris", "mixed"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn threshold_and_top_k_are_respected() {
        let store = store().await;
        let strict = SearchRequest { similarity_threshold: 0.99, ..request("Paris government", None) };
        assert_eq!(ids(&store.search(&strict).await.unwrap()), vec!["paris"]);

        let one = SearchRequest { top_k: 1, ..request("Rust compiler memory", None) };
        assert_eq!(ids(&store.search(&one).await.unwrap()), vec!["rust"]);
    }

    #[tokio::test]
    async fn filter_applies_before_ranking() {
        let store = store().await;
        let filter = FilterExpression::parse("source == 'news.md'").unwrap();
        let hits = store.search(&request("French capital", Some(&filter))).await.unwrap();
        assert_eq!(ids(&hits), vec!["mixed"]);
    }

    #[tokio::test]
    async fn unrelated_query_matches_nothing() {
        let store = store().await;
        assert!(store.search(&request("quarterly tax filing", None)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_store_skips_the_model() {
        let store = DocumentStore::new(testing::TopicEmbedder);
        assert!(store.is_empty());
        assert!(store.search(&request("anything", None)).await.unwrap().is_empty());
    }
}
