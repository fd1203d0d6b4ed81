use serde::Deserialize;
use tracing::info;

use mindbridge_core::models::review::{ChatRecord, DiagnosisUpdate, ReviewRow};

use crate::auth::MessageResponse;
use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Deserialize)]
struct SchoolsEnvelope {
    #[serde(default)]
    schools: Vec<String>,
}

#[derive(Deserialize)]
struct ResponsesEnvelope {
    #[serde(default)]
    responses: Vec<ReviewRow>,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    chat: ChatRecord,
}

pub async fn unique_schools(client: &ApiClient) -> Result<Vec<String>, ApiError> {
    let envelope: SchoolsEnvelope = client
        .get_json(&["api", "psychologist", "get-unique-schools"])
        .await?;
    Ok(envelope.schools)
}

/// Every session, without its conversation body.
pub async fn chat_responses(client: &ApiClient) -> Result<Vec<ReviewRow>, ApiError> {
    let envelope: ResponsesEnvelope = client
        .get_json(&["api", "psychologist", "chat-responses"])
        .await?;
    Ok(envelope.responses)
}

pub async fn chat_record(client: &ApiClient, session_id: &str) -> Result<ChatRecord, ApiError> {
    let envelope: ChatEnvelope = client
        .get_json(&["api", "psychologist", "chat", session_id])
        .await?;
    Ok(envelope.chat)
}

/// Overwrite a session's diagnosis. Last write wins; there is no
/// concurrency check against other reviewers.
pub async fn update_diagnosis(
    client: &ApiClient,
    update: &DiagnosisUpdate,
) -> Result<MessageResponse, ApiError> {
    info!(session_id = %update.session_id, "saving diagnosis");
    client
        .post_json(&["api", "psychologist", "update-diagnosis"], update)
        .await
}
