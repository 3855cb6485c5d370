use serde::Serialize;
use serde_json::Value;

/// Used when the conversation id field is left empty.
pub const DEFAULT_CONVERSATION_ID: &str = "test-1";

/// Who a rendered chat bubble belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    Error,
}

impl ChatRole {
    pub fn css_class(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Error => "error",
        }
    }
}

/// Which endpoint a submission goes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseMode {
    #[default]
    Stream,
    Call,
}

/// Request body for both `/rag/call` and `/rag/stream`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub conversation_id: String,
    pub user_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Builds the request body from the raw form fields.
///
/// `user_prompt` must already be trimmed and non-empty.
pub fn build_request_body(user_prompt: &str, conversation_id: &str, system_prompt: &str) -> RequestBody {
    let conversation_id = if conversation_id.is_empty() {
        DEFAULT_CONVERSATION_ID
    } else {
        conversation_id
    };
    let system_prompt = system_prompt.trim();

    RequestBody {
        conversation_id: conversation_id.to_string(),
        user_prompt: user_prompt.to_string(),
        system_prompt: (!system_prompt.is_empty()).then(|| system_prompt.to_string()),
    }
}

/// Pulls `result.output.text` out of a `/rag/call` response, falling back to
/// the whole payload pretty-printed.
pub fn reply_text(payload: &Value) -> String {
    payload
        .pointer("/result/output/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()))
}
