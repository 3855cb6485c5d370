use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream;
use tracing::warn;

use crate::agent::ChatAgent;
use crate::errors::AppError;
use crate::models::RagPromptBody;
use crate::rag::store::Embedder;
use crate::service::rag_chat_service::RagChatService;

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST `/rag/call`: one complete answer as JSON
pub async fn call_handler<A: ChatAgent, E: Embedder>(
    State(svc): State<RagChatService<A, E>>,
    Json(body): Json<RagPromptBody>,
) -> Response {
    match svc.call(&body).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => error_response(&err),
    }
}

/// POST `/rag/stream`: the answer as `data:` lines, flushed fragment by fragment
pub async fn stream_handler<A: ChatAgent, E: Embedder>(
    State(svc): State<RagChatService<A, E>>,
    Json(body): Json<RagPromptBody>,
) -> Response {
    let rx = match svc.stream(&body).await {
        Ok(rx) => rx,
        Err(err) => return error_response(&err),
    };

    // An `Err` item aborts the body; the client sees a broken stream.
    let frames = stream::unfold(rx, |mut rx| async move {
        let item = rx.recv().await?;
        let frame = item
            .map(|fragment| frame_data(&fragment))
            .inspect_err(|e| warn!("Aborting stream: {e}"));
        Some((frame, rx))
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream;charset=UTF-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Frames one fragment as `data:` lines (one per `\n`-separated line) plus a blank line.
pub fn frame_data(fragment: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }
    let mut frame = String::with_capacity(fragment.len() + 8);
    for line in fragment.split('\n') {
        frame.push_str("data:");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

fn error_response(err: &AppError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_agent_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, err.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_have_no_space_after_the_prefix() {
        assert_eq!(frame_data(" Hello"), "data: Hello\n\n");
    }

    #[test]
    fn multi_line_fragments_become_several_data_lines() {
        assert_eq!(frame_data("a\nb"), "data:a\ndata:b\n\n");
    }

    #[test]
    fn empty_fragments_produce_nothing() {
        assert_eq!(frame_data(""), "");
    }

    #[test]
    fn status_mapping_follows_error_kind() {
        let validation = error_response(&AppError::EmptyField { field_name: "userPrompt".into() });
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let down = error_response(&AppError::OllamaUnavailable { host: "h".into() });
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);

        let embedder_down =
            error_response(&AppError::EmbeddingUnavailable { message: "refused".into() });
        assert_eq!(embedder_down.status(), StatusCode::SERVICE_UNAVAILABLE);

        let other = error_response(&AppError::InferenceError { message: "x".into() });
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
