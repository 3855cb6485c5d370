use gloo_net::http::{Request, Response};
use js_sys::{Reflect, Uint8Array};
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

use crate::error::ChatError;
use crate::models::RequestBody;
use crate::transport::{ChunkSource, RagTransport};

/// Relative paths, so the app works from whichever origin serves it.
const CALL_ENDPOINT: &str = "/rag/call";
const STREAM_ENDPOINT: &str = "/rag/stream";

/// Talks to the RAG endpoints with the browser's `fetch`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

impl FetchTransport {
    async fn post(url: &str, body: &RequestBody) -> Result<Response, ChatError> {
        let resp = Request::post(url)
            .json(body)
            .map_err(|e| ChatError::Network(format!("Serialize error: {e}")))?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !resp.ok() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Request { status, body });
        }
        Ok(resp)
    }
}

impl RagTransport for FetchTransport {
    type Chunks = ResponseBodyReader;

    async fn call(&self, body: &RequestBody) -> Result<Value, ChatError> {
        let resp = Self::post(CALL_ENDPOINT, body).await?;
        resp.json::<Value>().await.map_err(|e| ChatError::Decode(e.to_string()))
    }

    async fn open_stream(&self, body: &RequestBody) -> Result<ResponseBodyReader, ChatError> {
        let resp = Self::post(STREAM_ENDPOINT, body).await?;
        let stream = resp
            .body()
            .ok_or_else(|| ChatError::StreamRead("response has no body".into()))?;
        let reader = stream
            .get_reader()
            .dyn_into::<ReadableStreamDefaultReader>()
            .map_err(|_| ChatError::StreamRead("failed to get stream reader".into()))?;
        Ok(ResponseBodyReader { reader })
    }
}

/// Pulls `Uint8Array` chunks off a fetch response body.
pub struct ResponseBodyReader {
    reader: ReadableStreamDefaultReader,
}

impl ChunkSource for ResponseBodyReader {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ChatError> {
        loop {
            let result = JsFuture::from(self.reader.read())
                .await
                .map_err(|e| ChatError::StreamRead(format!("{e:?}")))?;

            let done = Reflect::get(&result, &JsValue::from_str("done"))
                .map_err(|_| ChatError::StreamRead("missing done property".into()))?
                .as_bool()
                .unwrap_or(true);
            if done {
                return Ok(None);
            }

            let value = Reflect::get(&result, &JsValue::from_str("value"))
                .map_err(|_| ChatError::StreamRead("missing value property".into()))?;
            if value.is_undefined() {
                continue;
            }
            let array: Uint8Array = value
                .dyn_into()
                .map_err(|_| ChatError::StreamRead("chunk is not a Uint8Array".into()))?;
            return Ok(Some(array.to_vec()));
        }
    }
}
