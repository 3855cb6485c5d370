use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;

use crate::models::Message;

/// Per-conversation sliding window of the most recent messages.
#[derive(Debug)]
pub struct ChatMemory {
    max_messages: usize,
    conversations: Mutex<HashMap<String, VecDeque<Message>>>,
}

impl ChatMemory {
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages, conversations: Mutex::new(HashMap::new()) }
    }

    pub async fn history(&self, conversation_id: &str) -> Vec<Message> {
        self.conversations
            .lock()
            .await
            .get(conversation_id)
            .map(|window| window.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Appends messages, evicting the oldest once the window is full.
    pub async fn add(&self, conversation_id: &str, messages: impl IntoIterator<Item = Message>) {
        let mut conversations = self.conversations.lock().await;
        let window = conversations.entry(conversation_id.to_string()).or_default();
        window.extend(messages);
        let overflow = window.len().saturating_sub(self.max_messages);
        window.drain(..overflow);
    }
}
