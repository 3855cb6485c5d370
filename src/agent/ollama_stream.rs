//! Streaming turns against Ollama's `/api/chat`, which answers with one JSON
//! object per line:
//!
//! ```text
//! {"message":{"role":"assistant","content":"Hel"},"done":false}
//! {"message":{"role":"assistant","content":"lo"},"done":false}
//! {"message":{"role":"assistant","content":""},"done":true,"done_reason":"stop"}
//! ```

use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::agent::AgentRequest;
use crate::errors::AppError;
use crate::models::{ChatOptions, Message, MessageRole};

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

/// Ollama's `options` object. `num_predict` is its name for the token limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct OllamaOptions {
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u64>,
}

impl From<&ChatOptions> for OllamaOptions {
    fn from(options: &ChatOptions) -> Self {
        Self {
            temperature: options.temperature(),
            top_p: options.top_p,
            num_predict: options.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

fn ollama_role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn build_payload<'a>(model: &'a str, request: &'a AgentRequest) -> ChatPayload<'a> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(OllamaMessage { role: "system", content: &request.preamble });
    messages.extend(request.history.iter().map(|m: &Message| OllamaMessage {
        role: ollama_role(m.role),
        content: &m.content,
    }));
    messages.push(OllamaMessage { role: "user", content: &request.prompt });
    ChatPayload { model, messages, stream: true, options: OllamaOptions::from(&request.options) }
}

#[derive(Debug)]
enum LineOutcome {
    Continue,
    Done,
}

async fn forward_line(
    line: &[u8],
    tx: &mpsc::Sender<String>,
) -> Result<Option<LineOutcome>, AppError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(Some(LineOutcome::Continue));
    }
    let chunk: ChatChunk = serde_json::from_slice(line).map_err(|e| AppError::InferenceError {
        message: format!("malformed stream line: {e}"),
    })?;
    if let Some(message) = chunk.error {
        return Err(AppError::InferenceError { message });
    }
    if let Some(content) = chunk.message.map(|m| m.content).filter(|c| !c.is_empty()) {
        if tx.send(content).await.is_err() {
            // Receiver dropped: the client went away.
            return Ok(None);
        }
    }
    Ok(Some(if chunk.done { LineOutcome::Done } else { LineOutcome::Continue }))
}

pub(super) async fn stream_chat(
    http: &reqwest::Client,
    base_url: &str,
    model: &str,
    request: &AgentRequest,
    tx: mpsc::Sender<String>,
) -> Result<(), AppError> {
    let url = format!("{base_url}/api/chat");
    debug!("Streaming chat for conversation {} via {url}", request.conversation_id);

    let response = http
        .post(&url)
        .json(&build_payload(model, request))
        .send()
        .await
        .map_err(|e| {
            if e.is_connect() {
                AppError::OllamaUnavailable { host: base_url.to_string() }
            } else {
                AppError::InferenceError { message: e.to_string() }
            }
        })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::ModelNotFound { model_name: model.to_string() });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::InferenceError { message: format!("Ollama returned {status}: {body}") });
    }

    let mut bytes = response.bytes_stream();
    let mut pending: Vec<u8> = Vec::new();
    while let Some(chunk) = bytes.next().await {
        let chunk = chunk.map_err(|e| AppError::InferenceError {
            message: format!("stream read error: {e}"),
        })?;
        pending.extend_from_slice(&chunk);

        while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=newline).collect();
            match forward_line(&line[..line.len() - 1], &tx).await? {
                Some(LineOutcome::Continue) => {}
                Some(LineOutcome::Done) | None => return Ok(()),
            }
        }
    }

    if !pending.is_empty() && forward_line(&pending, &tx).await?.is_none() {
        return Ok(());
    }
    warn!("Ollama stream for conversation {} ended without a done marker", request.conversation_id);
    Ok(())
}
