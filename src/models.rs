use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One turn kept in conversation memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

/// Request body accepted by both `/rag/call` and `/rag/stream`.
///
/// Required fields default to empty so that a missing field is reported as a
/// validation error (400) rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagPromptBody {
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub user_prompt: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub filter_expression: Option<String>,
    #[serde(default)]
    pub chat_options: Option<ChatOptions>,
}

impl RagPromptBody {
    /// The system prompt, if one was given and is not blank.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn filter_expression(&self) -> Option<&str> {
        self.filter_expression.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Per-request generation settings. Unset fields keep the server defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u64>,
    #[serde(default)]
    pub top_p: Option<f64>,
}

/// Answers should stick to the retrieved documents, so sampling is greedy
/// unless a request asks otherwise.
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

impl ChatOptions {
    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// The model named in the options, or `default` when none (or a blank one) is given.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().filter(|m| !m.trim().is_empty()).unwrap_or(default)
    }
}

// ── `/rag/call` response ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResponse {
    pub result: Generation,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub output: AssistantOutput,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOutput {
    pub message_type: MessageRole,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub finish_reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub id: String,
    pub model: String,
    pub conversation_id: String,
}

impl CallResponse {
    pub fn new(conversation_id: &str, model: &str, text: String) -> Self {
        Self {
            result: Generation {
                output: AssistantOutput { message_type: MessageRole::Assistant, text },
                metadata: GenerationMetadata { finish_reason: "STOP".to_string() },
            },
            metadata: ResponseMetadata {
                id: uuid::Uuid::new_v4().to_string(),
                model: model.to_string(),
                conversation_id: conversation_id.to_string(),
            },
        }
    }
}
