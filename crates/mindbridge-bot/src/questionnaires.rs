use tracing::debug;

use mindbridge_core::models::questionnaire::QuestionnaireSummary;

use crate::backend::Backend;
use crate::error::BotError;
use crate::store::Store;

/// Reload the questionnaire catalogue into the store.
pub async fn refresh<'s, B: Backend>(
    backend: &B,
    store: &'s mut Store,
) -> Result<&'s [QuestionnaireSummary], BotError> {
    let listed = backend.list_questionnaires().await?;
    debug!(count = listed.len(), "questionnaires loaded");
    store.questionnaire.available = listed;
    Ok(&store.questionnaire.available)
}

/// Pick a questionnaire from the loaded catalogue by exact name.
pub fn choose<'s>(store: &'s Store, name: &str) -> Result<&'s QuestionnaireSummary, BotError> {
    store
        .questionnaire
        .available
        .iter()
        .find(|q| q.name == name)
        .ok_or_else(|| BotError::UnknownQuestionnaire(name.to_string()))
}
