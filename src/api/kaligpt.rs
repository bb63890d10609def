//! KaliGPT endpoints (/kaligpt/*)
//!
//! Reserved on the backend; responses are passed through untyped.

use super::client::{read_json, ApiClient};
use super::error::ApiError;

/// `POST /kaligpt/connect`
pub async fn connect(client: &ApiClient) -> Result<serde_json::Value, ApiError> {
    let resp = client.post_json("/kaligpt/connect", &serde_json::json!({})).await?;
    read_json(resp).await
}

/// `GET /kaligpt/status`
pub async fn status(client: &ApiClient) -> Result<serde_json::Value, ApiError> {
    let resp = client.get("/kaligpt/status").await?;
    read_json(resp).await
}
