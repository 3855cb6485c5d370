use crate::error::ChatError;
use crate::framing::{data_payload, LineFramer};
use crate::models::{reply_text, ChatRole, RequestBody};
use crate::sink::MessageSink;
use crate::transport::{ChunkSource, RagTransport};

/// Shown in place of an assistant reply that streamed no `data:` content.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "(empty response)";

/// Sends one prompt to `/rag/call` and renders the reply as a single message.
pub async fn send_call<T, S>(transport: &T, sink: &S, body: &RequestBody) -> Result<(), ChatError>
where
    T: RagTransport,
    S: MessageSink,
{
    let payload = transport.call(body).await?;
    sink.create(ChatRole::Assistant, &reply_text(&payload));
    Ok(())
}

/// Sends one prompt to `/rag/stream` and renders the reply as it arrives.
pub async fn send_stream<T, S>(transport: &T, sink: &S, body: &RequestBody) -> Result<(), ChatError>
where
    T: RagTransport,
    S: MessageSink,
{
    let mut chunks = transport.open_stream(body).await?;
    read_stream(&mut chunks, sink).await?;
    Ok(())
}

/// Renders the `data:` payloads of a response body into one assistant message
/// and returns the text that was rendered.
///
/// A read error ends the loop early; text appended before it stays.
pub async fn read_stream<C, S>(chunks: &mut C, sink: &S) -> Result<String, ChatError>
where
    C: ChunkSource,
    S: MessageSink,
{
    let handle = sink.create(ChatRole::Assistant, "");
    let mut framer = LineFramer::new();
    let mut rendered = String::new();

    let mut render = |line: &str| {
        if let Some(payload) = data_payload(line) {
            sink.append(&handle, payload);
            rendered.push_str(payload);
        }
    };

    while let Some(chunk) = chunks.next_chunk().await? {
        for line in framer.feed(&chunk) {
            render(&line);
        }
        sink.scroll_to_latest();
    }

    if let Some(rest) = framer.flush() {
        render(&rest);
    }

    if rendered.is_empty() {
        sink.append(&handle, EMPTY_RESPONSE_PLACEHOLDER);
        rendered.push_str(EMPTY_RESPONSE_PLACEHOLDER);
    }
    sink.scroll_to_latest();
    Ok(rendered)
}
