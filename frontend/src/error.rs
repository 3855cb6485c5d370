use thiserror::Error;

/// Everything that can go wrong between pressing send and the last chunk.
/// The `Display` text is what ends up in the error bubble.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Non-2xx status from either endpoint.
    #[error("HTTP {status}: {body}")]
    Request { status: u16, body: String },

    /// The response body broke off while being read.
    #[error("Stream read failed: {0}")]
    StreamRead(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_show_status_and_body() {
        let err = ChatError::Request { status: 503, body: "Ollama service unavailable".into() };
        assert_eq!(err.to_string(), "HTTP 503: Ollama service unavailable");
    }
}
