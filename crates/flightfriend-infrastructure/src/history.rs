//! Chat-history repository trait and the in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flightfriend_core::error::Result;
use flightfriend_core::message::Message;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One conversation as listed in a user's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub started_at: DateTime<Utc>,
    /// First user-visible line, for display in a history list.
    pub first_message: String,
}

/// Append-only store of chat messages keyed by (user id, conversation id).
#[async_trait]
pub trait ChatHistoryRepository: Send + Sync {
    /// Appends one message to a conversation.
    async fn save_message(
        &self,
        user_id: &str,
        conversation_id: &str,
        message: &Message,
    ) -> Result<()>;

    /// Lists a user's conversations, oldest first.
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>>;

    /// Loads every message of one conversation in creation order.
    async fn load_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<Message>>;

    /// Deletes one conversation.
    async fn delete_conversation(&self, user_id: &str, conversation_id: &str) -> Result<()>;

    /// Deletes all of a user's history.
    async fn clear_history(&self, user_id: &str) -> Result<()>;
}

type ConversationKey = (String, String);

/// Repository backed by process memory. The default when no history
/// backend is configured.
#[derive(Default)]
pub struct InMemoryHistoryRepository {
    store: RwLock<HashMap<ConversationKey, Vec<Message>>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatHistoryRepository for InMemoryHistoryRepository {
    async fn save_message(
        &self,
        user_id: &str,
        conversation_id: &str,
        message: &Message,
    ) -> Result<()> {
        let mut store = self.store.write().await;
        store
            .entry((user_id.to_string(), conversation_id.to_string()))
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let store = self.store.read().await;
        let mut summaries: Vec<ConversationSummary> = store
            .iter()
            .filter(|((user, _), messages)| user == user_id && !messages.is_empty())
            .map(|((_, conversation_id), messages)| ConversationSummary {
                conversation_id: conversation_id.clone(),
                started_at: messages[0].timestamp,
                first_message: messages[0].content.clone(),
            })
            .collect();
        summaries.sort_by_key(|summary| summary.started_at);
        Ok(summaries)
    }

    async fn load_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<Message>> {
        let store = self.store.read().await;
        Ok(store
            .get(&(user_id.to_string(), conversation_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_conversation(&self, user_id: &str, conversation_id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.remove(&(user_id.to_string(), conversation_id.to_string()));
        Ok(())
    }

    async fn clear_history(&self, user_id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.retain(|(user, _), _| user != user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let repo = InMemoryHistoryRepository::new();
        let user = Message::user("flights from Delhi to Mumbai");
        let bot = Message::bot("Searching now...");

        repo.save_message("u1", "c1", &user).await.unwrap();
        repo.save_message("u1", "c1", &bot).await.unwrap();

        let loaded = repo.load_conversation("u1", "c1").await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].content, "flights from Delhi to Mumbai");
        assert_eq!(loaded[1].content, "Searching now...");
    }

    #[tokio::test]
    async fn test_conversations_are_isolated_per_user() {
        let repo = InMemoryHistoryRepository::new();
        repo.save_message("u1", "c1", &Message::user("hello"))
            .await
            .unwrap();
        repo.save_message("u2", "c1", &Message::user("hi"))
            .await
            .unwrap();

        assert_eq!(repo.list_conversations("u1").await.unwrap().len(), 1);
        let other = repo.load_conversation("u2", "c1").await.unwrap();
        assert_eq!(other[0].content, "hi");
    }

    #[tokio::test]
    async fn test_delete_conversation() {
        let repo = InMemoryHistoryRepository::new();
        repo.save_message("u1", "c1", &Message::user("hello"))
            .await
            .unwrap();
        repo.delete_conversation("u1", "c1").await.unwrap();
        assert!(repo.load_conversation("u1", "c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_history_removes_all_of_one_user() {
        let repo = InMemoryHistoryRepository::new();
        repo.save_message("u1", "c1", &Message::user("a")).await.unwrap();
        repo.save_message("u1", "c2", &Message::user("b")).await.unwrap();
        repo.save_message("u2", "c3", &Message::user("c")).await.unwrap();

        repo.clear_history("u1").await.unwrap();

        assert!(repo.list_conversations("u1").await.unwrap().is_empty());
        assert_eq!(repo.list_conversations("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_carries_first_message() {
        let repo = InMemoryHistoryRepository::new();
        repo.save_message("u1", "c1", &Message::user("first"))
            .await
            .unwrap();
        repo.save_message("u1", "c1", &Message::bot("second"))
            .await
            .unwrap();

        let summaries = repo.list_conversations("u1").await.unwrap();
        assert_eq!(summaries[0].first_message, "first");
    }
}
