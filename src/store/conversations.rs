use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    pub fn user(content: String) -> Self {
        Self {
            role: MessageRole::User,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: String) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// A user-owned, append-only message history. Lives for process uptime
/// only; destroyed on restart.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub personality: String,
    pub messages: Vec<StoredMessage>,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// Storage seam for conversations. Handlers only talk to this trait, so a
/// persistent backend can replace the in-memory one without handler changes.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, user_id: &str, personality: &str) -> Conversation;

    async fn get(&self, id: &str) -> Option<Conversation>;

    /// Appends a message and bumps `last_active_at`. Returns the updated
    /// conversation, or `None` when the id is unknown.
    async fn append(&self, id: &str, message: StoredMessage) -> Option<Conversation>;

    /// All conversations owned by the user, most recently active first.
    async fn list_for_user(&self, user_id: &str) -> Vec<Conversation>;
}

#[derive(Default)]
pub struct MemoryConversationStore {
    inner: RwLock<HashMap<String, Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create(&self, user_id: &str, personality: &str) -> Conversation {
        let now = Utc::now();
        let conversation = Conversation {
            id: format!("conv_{}", Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            personality: personality.to_string(),
            messages: Vec::new(),
            started_at: now,
            last_active_at: now,
        };

        let mut map = self.inner.write().await;
        map.insert(conversation.id.clone(), conversation.clone());
        conversation
    }

    async fn get(&self, id: &str) -> Option<Conversation> {
        self.inner.read().await.get(id).cloned()
    }

    async fn append(&self, id: &str, message: StoredMessage) -> Option<Conversation> {
        let mut map = self.inner.write().await;
        let conversation = map.get_mut(id)?;
        conversation.messages.push(message);
        conversation.last_active_at = Utc::now();
        Some(conversation.clone())
    }

    async fn list_for_user(&self, user_id: &str) -> Vec<Conversation> {
        let map = self.inner.read().await;
        let mut conversations: Vec<Conversation> = map
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        conversations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_unique_ids_and_empty_history() {
        let store = MemoryConversationStore::new();
        let a = store.create("u1", "friendly_teacher").await;
        let b = store.create("u1", "casual_friend").await;

        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("conv_"));
        assert!(a.messages.is_empty());
        assert_eq!(a.user_id, "u1");
    }

    #[tokio::test]
    async fn append_is_ordered_and_bumps_activity() {
        let store = MemoryConversationStore::new();
        let conv = store.create("u1", "friendly_teacher").await;

        store
            .append(&conv.id, StoredMessage::user("hello".to_string()))
            .await
            .unwrap();
        let updated = store
            .append(&conv.id, StoredMessage::assistant("hi there".to_string()))
            .await
            .unwrap();

        assert_eq!(updated.messages.len(), 2);
        assert_eq!(updated.messages[0].role, MessageRole::User);
        assert_eq!(updated.messages[1].role, MessageRole::Assistant);
        assert!(updated.last_active_at >= conv.last_active_at);
    }

    #[tokio::test]
    async fn append_to_unknown_conversation_returns_none() {
        let store = MemoryConversationStore::new();
        let result = store
            .append("conv_missing", StoredMessage::user("hi".to_string()))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn list_for_user_only_returns_own_conversations() {
        let store = MemoryConversationStore::new();
        store.create("alice", "friendly_teacher").await;
        store.create("alice", "casual_friend").await;
        store.create("bob", "friendly_teacher").await;

        let alice = store.list_for_user("alice").await;
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|c| c.user_id == "alice"));

        let nobody = store.list_for_user("carol").await;
        assert!(nobody.is_empty());
    }
}
