//! Sidebar conversation endpoints (/conversation/*)

use super::client::{read_json, ApiClient};
use super::error::ApiError;
use crate::models::{ConversationMessage, ConversationSummary, RawConversation, RawMessage};

/// `GET /conversation/get`: the user's conversations, timestamps parsed.
pub async fn list_conversations(client: &ApiClient) -> Result<Vec<ConversationSummary>, ApiError> {
    let resp = client.get("/conversation/get").await?;
    let raw: Vec<RawConversation> = read_json(resp).await?;
    Ok(raw.into_iter().map(ConversationSummary::from).collect())
}

/// `GET /conversation/get/{id}`: messages of one conversation, timestamps parsed.
pub async fn open_conversation(
    client: &ApiClient,
    conversation_id: &str,
) -> Result<Vec<ConversationMessage>, ApiError> {
    let path = format!("/conversation/get/{}", urlencoding::encode(conversation_id));
    let resp = client.get(&path).await?;
    let raw: Vec<RawMessage> = read_json(resp).await?;
    Ok(raw.into_iter().map(ConversationMessage::from).collect())
}
