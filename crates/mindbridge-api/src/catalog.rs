use serde::{Deserialize, Serialize};

use mindbridge_core::models::questionnaire::{Audience, Questionnaire, QuestionnaireSummary};

use crate::auth::MessageResponse;
use crate::client::ApiClient;
use crate::error::ApiError;

/// Models offered when the backend cannot list its own.
pub const FALLBACK_MODELS: [&str; 2] = ["Gemini", "GPT-4"];

#[derive(Deserialize)]
struct QuestionnairesEnvelope {
    #[serde(default)]
    questionnaires: Vec<QuestionnaireSummary>,
}

#[derive(Deserialize)]
struct QuestionnaireEnvelope {
    questionnaire: Questionnaire,
}

#[derive(Deserialize)]
struct ModelsEnvelope {
    #[serde(default)]
    models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ping {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionnaireTypeBody<'a> {
    questionnaire_name: &'a str,
    #[serde(rename = "type")]
    audience: Audience,
}

pub async fn list_questionnaires(
    client: &ApiClient,
) -> Result<Vec<QuestionnaireSummary>, ApiError> {
    let envelope: QuestionnairesEnvelope =
        client.get_json(&["api", "get", "questionnaires"]).await?;
    Ok(envelope.questionnaires)
}

pub async fn get_questionnaire(client: &ApiClient, name: &str) -> Result<Questionnaire, ApiError> {
    let envelope: QuestionnaireEnvelope = client
        .get_json(&["api", "get", "questionnaire", name])
        .await?;
    Ok(envelope.questionnaire)
}

pub async fn list_models(client: &ApiClient) -> Result<Vec<String>, ApiError> {
    let envelope: ModelsEnvelope = client.get_json(&["api", "get", "models"]).await?;
    Ok(envelope.models)
}

/// Like [`list_models`], but never fails: any error yields
/// [`FALLBACK_MODELS`].
pub async fn models_or_fallback(client: &ApiClient) -> Vec<String> {
    match list_models(client).await {
        Ok(models) if !models.is_empty() => models,
        Ok(_) => FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "model list unavailable, using fallback");
            FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
        }
    }
}

pub async fn ping(client: &ApiClient) -> Result<Ping, ApiError> {
    client.get_json(&["api", "get", "ping"]).await
}

/// Mark a questionnaire as the active one for an audience.
pub async fn set_questionnaire_type(
    client: &ApiClient,
    questionnaire_name: &str,
    audience: Audience,
) -> Result<MessageResponse, ApiError> {
    client
        .post_json(
            &["set_questionnaire_type"],
            &QuestionnaireTypeBody {
                questionnaire_name,
                audience,
            },
        )
        .await
}
