//! AI chat endpoint (/ai/chat)

use reqwest::multipart::{Form, Part};

use super::client::{read_json, ApiClient};
use super::error::ApiError;
use crate::models::{ChatReply, ChatRequest};

/// Build the multipart body: `conversation`, `content`, optional `file`.
/// An absent conversation is sent as an empty field, which the server
/// treats as "start a new one".
fn chat_form(request: ChatRequest) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("conversation", request.conversation.unwrap_or_default())
        .text("content", request.content);

    if let Some(file) = request.file {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| ApiError::Invalid(format!("attachment: {}", e)))?;
        form = form.part("file", part);
    }
    Ok(form)
}

/// `POST /ai/chat`
pub async fn send_message(client: &ApiClient, request: ChatRequest) -> Result<ChatReply, ApiError> {
    tracing::debug!(
        "Sending chat message (conversation: {}, attachment: {})",
        request.conversation.as_deref().unwrap_or("new"),
        request.file.is_some()
    );
    let form = chat_form(request)?;
    let resp = client.post_multipart("/ai/chat", form).await?;
    read_json(resp).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{response, serve};
    use crate::auth::CookieJar;
    use crate::models::Attachment;
    use std::time::Duration;

    fn reply_json() -> String {
        response(
            "200 OK",
            &["Content-Type: application/json"],
            r#"{"reply": "Start with nmap -sV.", "conversation": "c9"}"#,
        )
    }

    #[tokio::test]
    async fn test_new_conversation_sends_empty_field_and_file() {
        let (base, mut seen) = serve(vec![reply_json()]).await;
        let client = ApiClient::backend(&base, CookieJar::new(), Duration::from_secs(5)).unwrap();

        let request = ChatRequest {
            conversation: None,
            content: "see attached".to_string(),
            file: Some(Attachment {
                file_name: "notes.txt".to_string(),
                bytes: b"nmap -sV".to_vec(),
            }),
        };
        let reply = send_message(&client, request).await.unwrap();
        assert_eq!(reply.reply, "Start with nmap -sV.");
        assert_eq!(reply.conversation.as_deref(), Some("c9"));

        let req = seen.recv().await.unwrap();
        assert!(req.request_line().starts_with("POST /ai/chat "));
        assert!(req
            .header("content-type")
            .unwrap()
            .starts_with("multipart/form-data"));

        let body = req.body_text();
        assert!(body.contains("name=\"conversation\"\r\n\r\n\r\n"));
        assert!(body.contains("name=\"content\"\r\n\r\nsee attached\r\n"));
        assert!(body.contains("name=\"file\"; filename=\"notes.txt\""));
        assert!(body.contains("nmap -sV"));
    }

    #[tokio::test]
    async fn test_existing_conversation_without_file() {
        let (base, mut seen) = serve(vec![reply_json()]).await;
        let client = ApiClient::backend(&base, CookieJar::new(), Duration::from_secs(5)).unwrap();

        let request = ChatRequest {
            conversation: Some("c1".to_string()),
            content: "hello".to_string(),
            file: None,
        };
        send_message(&client, request).await.unwrap();

        let body = seen.recv().await.unwrap().body_text();
        assert!(body.contains("name=\"conversation\"\r\n\r\nc1\r\n"));
        assert!(body.contains("name=\"content\"\r\n\r\nhello\r\n"));
        assert!(!body.contains("name=\"file\""));
    }
}
