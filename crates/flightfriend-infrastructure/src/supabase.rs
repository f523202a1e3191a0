//! Supabase-backed chat-history repository.
//!
//! Talks to the `chat_history` table through the PostgREST endpoint. Rows
//! are append-only; "deleting" a conversation issues a filtered DELETE.
//! Rows with an unknown `message_type` are kept and shown as bot messages
//! rather than dropped.

use crate::history::{ChatHistoryRepository, ConversationSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flightfriend_core::error::{FlightFriendError, Result};
use flightfriend_core::message::{Message, MessageRole};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

const TABLE: &str = "chat_history";

/// Chat-history repository over the Supabase REST API.
pub struct SupabaseHistoryRepository {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct NewRow<'a> {
    id: &'a str,
    user_id: &'a str,
    conversation_id: &'a str,
    message_content: &'a str,
    message_type: &'a str,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Row {
    id: String,
    conversation_id: String,
    message_content: String,
    message_type: String,
    created_at: DateTime<Utc>,
}

impl SupabaseHistoryRepository {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn fetch_rows(&self, query: &[(&str, String)]) -> Result<Vec<Row>> {
        let response = self
            .authed(self.client.get(self.table_url()).query(query))
            .send()
            .await
            .map_err(|err| FlightFriendError::history(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("[SupabaseHistory] Query failed ({status}): {body}");
            return Err(FlightFriendError::history(format!("{status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|err| FlightFriendError::history(format!("malformed response: {err}")))
    }
}

fn row_to_message(row: Row) -> Message {
    let role = match row.message_type.as_str() {
        "user" => MessageRole::User,
        "bot" => MessageRole::Bot,
        other => {
            warn!("[SupabaseHistory] Unknown message type '{other}', treating as bot");
            MessageRole::Bot
        }
    };
    Message {
        id: row.id,
        content: row.message_content,
        role,
        timestamp: row.created_at,
    }
}

#[async_trait]
impl ChatHistoryRepository for SupabaseHistoryRepository {
    async fn save_message(
        &self,
        user_id: &str,
        conversation_id: &str,
        message: &Message,
    ) -> Result<()> {
        let generated_id;
        let id = if message.id.is_empty() {
            generated_id = Uuid::new_v4().to_string();
            &generated_id
        } else {
            &message.id
        };
        let row = NewRow {
            id,
            user_id,
            conversation_id,
            message_content: &message.content,
            message_type: message.role.as_str(),
            created_at: message.timestamp,
        };

        debug!("[SupabaseHistory] Saving {} message to {conversation_id}", row.message_type);
        let response = self
            .authed(self.client.post(self.table_url()).json(&row))
            .send()
            .await
            .map_err(|err| FlightFriendError::history(format!("save failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FlightFriendError::history(format!("save failed {status}: {body}")));
        }
        Ok(())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let rows = self
            .fetch_rows(&[
                ("select", "id,conversation_id,message_content,message_type,created_at".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.asc".to_string()),
            ])
            .await?;

        // First row per conversation id wins.
        let mut summaries: Vec<ConversationSummary> = Vec::new();
        for row in rows {
            if summaries
                .iter()
                .any(|s| s.conversation_id == row.conversation_id)
            {
                continue;
            }
            summaries.push(ConversationSummary {
                conversation_id: row.conversation_id,
                started_at: row.created_at,
                first_message: row.message_content,
            });
        }
        Ok(summaries)
    }

    async fn load_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<Message>> {
        let rows = self
            .fetch_rows(&[
                ("select", "id,conversation_id,message_content,message_type,created_at".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("conversation_id", format!("eq.{conversation_id}")),
                ("order", "created_at.asc".to_string()),
            ])
            .await?;
        Ok(rows.into_iter().map(row_to_message).collect())
    }

    async fn delete_conversation(&self, user_id: &str, conversation_id: &str) -> Result<()> {
        let response = self
            .authed(self.client.delete(self.table_url()).query(&[
                ("user_id", format!("eq.{user_id}")),
                ("conversation_id", format!("eq.{conversation_id}")),
            ]))
            .send()
            .await
            .map_err(|err| FlightFriendError::history(format!("delete failed: {err}")))?;
        if !response.status().is_success() {
            return Err(FlightFriendError::history(format!(
                "delete failed: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn clear_history(&self, user_id: &str) -> Result<()> {
        let response = self
            .authed(
                self.client
                    .delete(self.table_url())
                    .query(&[("user_id", format!("eq.{user_id}"))]),
            )
            .send()
            .await
            .map_err(|err| FlightFriendError::history(format!("clear failed: {err}")))?;
        if !response.status().is_success() {
            return Err(FlightFriendError::history(format!(
                "clear failed: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_mapping_to_message() {
        let row: Row = serde_json::from_str(
            r#"{
                "id": "m1",
                "user_id": "u1",
                "conversation_id": "c1",
                "message_content": "hello",
                "message_type": "user",
                "created_at": "2026-08-23T10:00:00Z"
            }"#,
        )
        .unwrap();
        let message = row_to_message(row);
        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn test_unknown_message_type_becomes_bot() {
        let row: Row = serde_json::from_str(
            r#"{
                "id": "m2",
                "conversation_id": "c1",
                "message_content": "??",
                "message_type": "system",
                "created_at": "2026-08-23T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(row_to_message(row).role, MessageRole::Bot);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let repo = SupabaseHistoryRepository::new("https://example.supabase.co/", "key");
        assert_eq!(
            repo.table_url(),
            "https://example.supabase.co/rest/v1/chat_history"
        );
    }
}
