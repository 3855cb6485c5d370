mod ollama_stream;

use std::future::Future;

use rig::client::Nothing;
use rig::completion::Chat;
use rig::message::Message as RigMessage;
use rig::prelude::{CompletionClient, EmbeddingsClient};
use rig::providers::ollama;
use tokio::sync::mpsc;
use tracing::error;

use crate::errors::AppError;
use crate::models::{ChatOptions, Message, MessageRole};

use self::ollama_stream::OllamaOptions;

pub const DEFAULT_PREAMBLE: &str = "You are a helpful assistant that answers questions \
                                    using the documents provided in the prompt. \
                                    Be concise and accurate. \
                                    If you don't know something, say so.";

/// Everything the model needs for one turn.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub conversation_id: String,
    pub preamble: String,
    pub history: Vec<Message>,
    pub prompt: String,
    pub options: ChatOptions,
}

/// A chat model that can answer one turn either whole or as a stream of text fragments.
pub trait ChatAgent: Clone + Send + Sync + 'static {
    /// The model used when a request does not pick one.
    fn model_name(&self) -> &str;

    fn chat(&self, request: &AgentRequest) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Sends each fragment on `tx` as it arrives. Returns once the model is done
    /// or the receiver has gone away.
    fn stream_chat(
        &self,
        request: &AgentRequest,
        tx: mpsc::Sender<String>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Builds a rig [`RigMessage`] history list from remembered [`Message`] records.
/// The system prompt is not part of history; it goes in as the preamble.
fn to_rig_history(messages: &[Message]) -> Vec<RigMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            MessageRole::User => RigMessage::user(&m.content),
            MessageRole::Assistant => RigMessage::assistant(&m.content),
        })
        .collect()
}

/// Ollama-backed agent. One-shot turns go through rig; streamed turns read
/// Ollama's NDJSON chat endpoint directly.
#[derive(Clone)]
pub struct OllamaAgentService {
    client: ollama::Client,
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaAgentService {
    pub fn new(base_url: &str, model: &str) -> Result<Self, AppError> {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(base_url)
            .build()
            .map_err(|e| AppError::invalid_config("OLLAMA_API_BASE_URL", e.to_string()))?;
        Ok(Self {
            client,
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Embedding model served by the same Ollama instance.
    pub fn embedding_model(&self, model: &str) -> ollama::EmbeddingModel {
        self.client.embedding_model(model)
    }

    fn classify_failure(&self, model: &str, message: String) -> AppError {
        if message.contains("Connection refused") || message.contains("connect") {
            AppError::OllamaUnavailable { host: self.base_url.clone() }
        } else if message.contains("model") {
            AppError::ModelNotFound { model_name: model.to_string() }
        } else {
            AppError::InferenceError { message }
        }
    }
}

impl ChatAgent for OllamaAgentService {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: &AgentRequest) -> Result<String, AppError> {
        let options = &request.options;
        let model = options.model_or(&self.model);
        let sampling = serde_json::to_value(OllamaOptions::from(options))
            .map_err(|e| AppError::Unexpected(format!("could not encode chat options: {e}")))?;
        let agent = self
            .client
            .agent(model)
            .preamble(&request.preamble)
            .temperature(options.temperature())
            .additional_params(sampling)
            .build();

        let rig_history = to_rig_history(&request.history);

        agent
            .chat(request.prompt.as_str(), rig_history)
            .await
            .map_err(|e| {
                error!("Ollama inference failed for conversation {}: {e}", request.conversation_id);
                self.classify_failure(model, e.to_string())
            })
    }

    async fn stream_chat(
        &self,
        request: &AgentRequest,
        tx: mpsc::Sender<String>,
    ) -> Result<(), AppError> {
        let model = request.options.model_or(&self.model);
        ollama_stream::stream_chat(&self.http, &self.base_url, model, request, tx)
            .await
            .inspect_err(|e| {
                error!("Ollama streaming failed for conversation {}: {e}", request.conversation_id)
            })
    }
}
