use std::future::Future;

use serde_json::Value;

use crate::error::ChatError;
use crate::models::RequestBody;

/// An open response body, read one chunk at a time.
pub trait ChunkSource {
    /// The next chunk, or `None` once the body is complete.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, ChatError>>;
}

/// The two RAG endpoints. Implementations turn non-2xx statuses into
/// [`ChatError::Request`] before returning.
pub trait RagTransport {
    type Chunks: ChunkSource;

    fn call(&self, body: &RequestBody) -> impl Future<Output = Result<Value, ChatError>>;

    fn open_stream(&self, body: &RequestBody) -> impl Future<Output = Result<Self::Chunks, ChatError>>;
}
