//! Current-conversation tracking over a history repository.
//!
//! Owns the "which conversation am I in" pointer and applies the
//! degrade-gracefully policy: a failing backend is logged and treated as
//! no history available, never surfaced to the conversation loop.

use crate::history::{ChatHistoryRepository, ConversationSummary};
use flightfriend_core::message::Message;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

pub struct ConversationService {
    repository: Arc<dyn ChatHistoryRepository>,
    user_id: String,
    current: Mutex<Option<String>>,
}

impl ConversationService {
    pub fn new(repository: Arc<dyn ChatHistoryRepository>, user_id: impl Into<String>) -> Self {
        Self {
            repository,
            user_id: user_id.into(),
            current: Mutex::new(None),
        }
    }

    /// The active conversation id, resuming the user's most recent
    /// conversation when there is one, otherwise starting fresh.
    pub async fn get_or_create(&self) -> String {
        let mut current = self.current.lock().await;
        if let Some(id) = current.as_ref() {
            return id.clone();
        }
        let resumed = match self.repository.list_conversations(&self.user_id).await {
            Ok(conversations) => conversations
                .last()
                .map(|summary| summary.conversation_id.clone()),
            Err(err) => {
                warn!("[ConversationService] Could not list conversations: {err}");
                None
            }
        };
        let id = resumed.unwrap_or_else(|| Uuid::new_v4().to_string());
        *current = Some(id.clone());
        id
    }

    /// Abandons the current conversation pointer and starts a new one.
    pub async fn start_new(&self) -> String {
        let id = Uuid::new_v4().to_string();
        *self.current.lock().await = Some(id.clone());
        id
    }

    /// Persists one message to the active conversation. Failures are
    /// logged, not returned.
    pub async fn record(&self, message: &Message) {
        let conversation_id = self.get_or_create().await;
        if let Err(err) = self
            .repository
            .save_message(&self.user_id, &conversation_id, message)
            .await
        {
            warn!("[ConversationService] Could not save message: {err}");
        }
    }

    /// Loads the active conversation's messages, empty on any failure.
    pub async fn load_messages(&self) -> Vec<Message> {
        let conversation_id = self.get_or_create().await;
        match self
            .repository
            .load_conversation(&self.user_id, &conversation_id)
            .await
        {
            Ok(messages) => messages,
            Err(err) => {
                warn!("[ConversationService] Could not load history: {err}");
                Vec::new()
            }
        }
    }

    /// Lists the user's conversations, empty on any failure.
    pub async fn list(&self) -> Vec<ConversationSummary> {
        match self.repository.list_conversations(&self.user_id).await {
            Ok(conversations) => conversations,
            Err(err) => {
                warn!("[ConversationService] Could not list conversations: {err}");
                Vec::new()
            }
        }
    }

    /// Deletes one conversation; a deleted active conversation is replaced
    /// by a fresh one.
    pub async fn delete(&self, conversation_id: &str) -> bool {
        match self
            .repository
            .delete_conversation(&self.user_id, conversation_id)
            .await
        {
            Ok(()) => {
                let mut current = self.current.lock().await;
                if current.as_deref() == Some(conversation_id) {
                    *current = Some(Uuid::new_v4().to_string());
                }
                true
            }
            Err(err) => {
                warn!("[ConversationService] Could not delete conversation: {err}");
                false
            }
        }
    }

    /// Deletes everything the user ever said and starts fresh.
    pub async fn clear_all(&self) -> bool {
        match self.repository.clear_history(&self.user_id).await {
            Ok(()) => {
                *self.current.lock().await = Some(Uuid::new_v4().to_string());
                true
            }
            Err(err) => {
                warn!("[ConversationService] Could not clear history: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::InMemoryHistoryRepository;
    use async_trait::async_trait;
    use flightfriend_core::error::{FlightFriendError, Result};

    fn service() -> ConversationService {
        ConversationService::new(Arc::new(InMemoryHistoryRepository::new()), "u1")
    }

    #[tokio::test]
    async fn test_record_and_reload() {
        let service = service();
        service.record(&Message::user("hello")).await;
        service.record(&Message::bot("hi!")).await;

        let messages = service.load_messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_start_new_switches_conversation() {
        let service = service();
        service.record(&Message::user("first")).await;
        let old_id = service.get_or_create().await;

        let new_id = service.start_new().await;
        assert_ne!(old_id, new_id);
        assert!(service.load_messages().await.is_empty());

        // The old conversation is still listed.
        assert_eq!(service.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_resumes_most_recent_conversation() {
        let repository = Arc::new(InMemoryHistoryRepository::new());
        {
            let earlier = ConversationService::new(repository.clone(), "u1");
            earlier.record(&Message::user("earlier session")).await;
        }
        let later = ConversationService::new(repository, "u1");
        let messages = later.load_messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "earlier session");
    }

    #[tokio::test]
    async fn test_delete_active_conversation_starts_fresh() {
        let service = service();
        service.record(&Message::user("to be deleted")).await;
        let id = service.get_or_create().await;

        assert!(service.delete(&id).await);
        assert!(service.load_messages().await.is_empty());
    }

    struct FailingRepository;

    #[async_trait]
    impl ChatHistoryRepository for FailingRepository {
        async fn save_message(&self, _: &str, _: &str, _: &Message) -> Result<()> {
            Err(FlightFriendError::history("backend down"))
        }
        async fn list_conversations(&self, _: &str) -> Result<Vec<ConversationSummary>> {
            Err(FlightFriendError::history("backend down"))
        }
        async fn load_conversation(&self, _: &str, _: &str) -> Result<Vec<Message>> {
            Err(FlightFriendError::history("backend down"))
        }
        async fn delete_conversation(&self, _: &str, _: &str) -> Result<()> {
            Err(FlightFriendError::history("backend down"))
        }
        async fn clear_history(&self, _: &str) -> Result<()> {
            Err(FlightFriendError::history("backend down"))
        }
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_empty_history() {
        let service = ConversationService::new(Arc::new(FailingRepository), "u1");
        service.record(&Message::user("lost")).await;
        assert!(service.load_messages().await.is_empty());
        assert!(service.list().await.is_empty());
        assert!(!service.clear_all().await);
    }
}
