pub mod rag_routes;

use axum::routing::post;
use axum::Router;

use crate::agent::ChatAgent;
use crate::rag::store::Embedder;
use crate::routes::rag_routes::{call_handler, stream_handler};
use crate::service::rag_chat_service::RagChatService;

/// The `/rag/*` API. Static files and middleware are layered on in `main`.
pub fn rag_router<A: ChatAgent, E: Embedder>(svc: RagChatService<A, E>) -> Router {
    Router::new()
        .route("/rag/call", post(call_handler::<A, E>))
        .route("/rag/stream", post(stream_handler::<A, E>))
        .with_state(svc)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::agent::testing::FakeAgent;
    use crate::memory::ChatMemory;
    use crate::rag::store::testing::TopicEmbedder;
    use crate::rag::store::DocumentStore;
    use crate::service::rag_chat_service::RetrievalSettings;

    const MAX_SIZE: usize = 1024 * 1024;

    fn app(agent: FakeAgent) -> Router {
        rag_router(RagChatService::new(
            agent,
            Arc::new(DocumentStore::new(TopicEmbedder)),
            Arc::new(ChatMemory::new(10)),
            RetrievalSettings { top_k: 3, similarity_threshold: 0.3 },
        ))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn call_returns_text_under_result_output() {
        let response = app(FakeAgent::replying("Hi there"))
            .oneshot(post_json("/rag/call", json!({"conversationId": "c1", "userPrompt": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), MAX_SIZE).await.unwrap();
        let payload: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload["result"]["output"]["text"], "Hi there");
    }

    #[tokio::test]
    async fn stream_emits_data_lines() {
        let response = app(FakeAgent::streaming(&[" Hello", " World"]))
            .oneshot(post_json("/rag/stream", json!({"conversationId": "c1", "userPrompt": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));
        let bytes = to_bytes(response.into_body(), MAX_SIZE).await.unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), "data: Hello\n\ndata: World\n\n");
    }

    #[tokio::test]
    async fn missing_prompt_is_a_bad_request() {
        let response = app(FakeAgent::replying("unused"))
            .oneshot(post_json("/rag/call", json!({"conversationId": "c1"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), MAX_SIZE).await.unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), "Field 'userPrompt' cannot be empty");
    }

    #[tokio::test]
    async fn unavailable_model_is_service_unavailable() {
        let response = app(FakeAgent::unavailable())
            .oneshot(post_json("/rag/call", json!({"conversationId": "c1", "userPrompt": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn chat_options_are_accepted_in_the_body() {
        let agent = FakeAgent::replying("ok");
        let response = app(agent.clone())
            .oneshot(post_json(
                "/rag/call",
                json!({
                    "conversationId": "c1",
                    "userPrompt": "hello",
                    "chatOptions": {"temperature": 0.4, "topP": 0.8}
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let options = agent.last_request().unwrap().options;
        assert_eq!(options.temperature, Some(0.4));
        assert_eq!(options.top_p, Some(0.8));
    }
}
