use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::agent::ChatAgent;
use crate::models::RagPromptBody;
use crate::rag::store::Embedder;
use crate::service::rag_chat_service::RagChatService;

/// Every terminal turn shares one conversation.
pub const CLI_CONVERSATION_ID: &str = "cli";

const BANNER: &str = "\nRAG chat CLI bot\n";

/// Interactive chat over a line-based reader and writer: one prompt per line,
/// answers streamed as they arrive. Returns at end of input.
pub async fn run_session<A, E, R, W>(
    svc: &RagChatService<A, E>,
    filter_expression: Option<&str>,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    A: ChatAgent,
    E: Embedder,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(BANNER.as_bytes()).await?;
    let mut lines = input.lines();

    loop {
        output.write_all(b"\nUSER: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let body = RagPromptBody {
            conversation_id: CLI_CONVERSATION_ID.to_string(),
            user_prompt: line,
            filter_expression: filter_expression.map(str::to_string),
            ..RagPromptBody::default()
        };

        output.write_all(b"\nASSISTANT: ").await?;
        match svc.stream(&body).await {
            Ok(mut rx) => {
                while let Some(item) = rx.recv().await {
                    match item {
                        Ok(fragment) => {
                            output.write_all(fragment.as_bytes()).await?;
                            output.flush().await?;
                        }
                        Err(e) => {
                            warn!("CLI turn failed mid-stream: {e}");
                            output.write_all(format!("[error: {e}]").as_bytes()).await?;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("CLI turn rejected: {e}");
                output.write_all(format!("[error: {e}]").as_bytes()).await?;
            }
        }
        output.write_all(b"\n").await?;
    }

    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agent::testing::FakeAgent;
    use crate::memory::ChatMemory;
    use crate::models::Message;
    use crate::rag::store::testing::TopicEmbedder;
    use crate::rag::store::DocumentStore;
    use crate::service::rag_chat_service::RetrievalSettings;

    fn service(agent: FakeAgent) -> RagChatService<FakeAgent, TopicEmbedder> {
        RagChatService::new(
            agent,
            Arc::new(DocumentStore::new(TopicEmbedder)),
            Arc::new(ChatMemory::new(10)),
            RetrievalSettings { top_k: 3, similarity_threshold: 0.3 },
        )
    }

    async fn run(
        svc: &RagChatService<FakeAgent, TopicEmbedder>,
        filter: Option<&str>,
        input: &str,
    ) -> String {
        let mut output = Vec::new();
        run_session(svc, filter, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn each_line_is_one_streamed_turn() {
        let agent = FakeAgent::streaming(&["Steep ", "it."]);
        let svc = service(agent.clone());

        let transcript = run(&svc, None, "How long for tea?\n\nAnd green tea?\n").await;

        assert!(transcript.starts_with(BANNER));
        assert_eq!(transcript.matches("\nASSISTANT: Steep it.\n").count(), 2);
        assert!(transcript.ends_with("\nUSER: "));

        let requests = agent.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.conversation_id == CLI_CONVERSATION_ID));
        assert_eq!(
            requests[1].history,
            vec![Message::user("How long for tea?"), Message::assistant("Steep it.")]
        );
    }

    #[tokio::test]
    async fn errors_are_printed_and_the_session_continues() {
        let agent = FakeAgent::streaming(&["ok"]);
        let svc = service(agent.clone());

        let transcript = run(&svc, Some("source = tea"), "first\nsecond\n").await;

        assert_eq!(transcript.matches("[error: Invalid filter expression").count(), 2);
        assert!(agent.last_request().is_none());
    }

    #[tokio::test]
    async fn agent_failures_show_up_inline() {
        let svc = service(FakeAgent::unavailable());

        let transcript = run(&svc, None, "hello\n").await;
        assert!(transcript.contains("\nASSISTANT: [error: Ollama service unavailable at http://fake]\n"));
    }
}
