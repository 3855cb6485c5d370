use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::agent::{AgentRequest, ChatAgent, DEFAULT_PREAMBLE};
use crate::errors::AppError;
use crate::memory::ChatMemory;
use crate::models::{CallResponse, Message, RagPromptBody};
use crate::rag::augmenter::augment_query;
use crate::rag::filter::FilterExpression;
use crate::rag::store::{DocumentStore, Embedder, SearchRequest};

const STREAM_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub similarity_threshold: f64,
}

/// A validated turn, ready to hand to the agent.
#[derive(Debug, Clone)]
struct PreparedTurn {
    conversation_id: String,
    user_prompt: String,
    agent_request: AgentRequest,
}

#[derive(Clone)]
pub struct RagChatService<A, E: Embedder> {
    agent: A,
    store: Arc<DocumentStore<E>>,
    memory: Arc<ChatMemory>,
    retrieval: RetrievalSettings,
}

impl<A: ChatAgent, E: Embedder> RagChatService<A, E> {
    pub fn new(
        agent: A,
        store: Arc<DocumentStore<E>>,
        memory: Arc<ChatMemory>,
        retrieval: RetrievalSettings,
    ) -> Self {
        Self { agent, store, memory, retrieval }
    }

    /// Answers one turn in full.
    pub async fn call(&self, body: &RagPromptBody) -> Result<CallResponse, AppError> {
        let turn = self.prepare(body).await?;
        let reply = self.agent.chat(&turn.agent_request).await?;

        self.memory
            .add(&turn.conversation_id, [Message::user(turn.user_prompt), Message::assistant(reply.clone())])
            .await;

        let model = turn.agent_request.options.model_or(self.agent.model_name());
        Ok(CallResponse::new(&turn.conversation_id, model, reply))
    }

    /// Starts one streamed turn. Fragments arrive on the returned receiver in
    /// model order; an `Err` item means the model failed mid-stream.
    pub async fn stream(
        &self,
        body: &RagPromptBody,
    ) -> Result<mpsc::Receiver<Result<String, AppError>>, AppError> {
        let turn = self.prepare(body).await?;
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let agent = self.agent.clone();
        let memory = Arc::clone(&self.memory);

        tokio::spawn(async move {
            let (agent_tx, mut agent_rx) = mpsc::channel::<String>(STREAM_CHANNEL_CAPACITY);
            let request = turn.agent_request.clone();
            let agent_handle =
                tokio::spawn(async move { agent.stream_chat(&request, agent_tx).await });

            let mut full_content = String::new();
            let mut client_connected = true;
            while let Some(fragment) = agent_rx.recv().await {
                full_content.push_str(&fragment);
                if tx.send(Ok(fragment)).await.is_err() {
                    client_connected = false;
                    break;
                }
            }
            drop(agent_rx);

            match agent_handle.await {
                Ok(Ok(())) if client_connected => {
                    memory
                        .add(
                            &turn.conversation_id,
                            [Message::user(turn.user_prompt), Message::assistant(full_content)],
                        )
                        .await;
                }
                Ok(Ok(())) => {
                    info!("Client left conversation {} before the stream finished", turn.conversation_id);
                }
                Ok(Err(e)) => {
                    let _ = tx.send(Err(e)).await;
                }
                Err(e) => {
                    error!("Agent task panicked: {e}");
                    let _ = tx
                        .send(Err(AppError::Unexpected("Internal error during streaming".to_string())))
                        .await;
                }
            }
        });

        Ok(rx)
    }

    // Required fields must be non-empty; whitespace alone is accepted.
    async fn prepare(&self, body: &RagPromptBody) -> Result<PreparedTurn, AppError> {
        if body.conversation_id.is_empty() {
            return Err(AppError::EmptyField { field_name: "conversationId".to_string() });
        }
        if body.user_prompt.is_empty() {
            return Err(AppError::EmptyField { field_name: "userPrompt".to_string() });
        }

        let filter = body.filter_expression().map(FilterExpression::parse).transpose()?;
        let hits = self
            .store
            .search(&SearchRequest {
                query: &body.user_prompt,
                top_k: self.retrieval.top_k,
                similarity_threshold: self.retrieval.similarity_threshold,
                filter: filter.as_ref(),
            })
            .await?;
        debug!(
            "Retrieved {} documents for conversation {}: {:?}",
            hits.len(),
            body.conversation_id,
            hits.iter().map(|h| (&h.document.id, h.score)).collect::<Vec<_>>()
        );

        let history = self.memory.history(&body.conversation_id).await;

        Ok(PreparedTurn {
            conversation_id: body.conversation_id.clone(),
            user_prompt: body.user_prompt.clone(),
            agent_request: AgentRequest {
                conversation_id: body.conversation_id.clone(),
                preamble: body.system_prompt().unwrap_or(DEFAULT_PREAMBLE).to_string(),
                history,
                prompt: augment_query(&body.user_prompt, &hits),
                options: body.chat_options.clone().unwrap_or_default(),
            },
        })
    }
}
