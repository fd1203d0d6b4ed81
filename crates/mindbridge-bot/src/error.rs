use mindbridge_api::error::ApiError;
use mindbridge_core::validation::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("the questionnaire is already complete")]
    SessionComplete,

    #[error("no questionnaire session is active")]
    NoSession,

    #[error("no questionnaire named '{0}'")]
    UnknownQuestionnaire(String),

    #[error("option {index} is out of range for {len} choices")]
    InvalidOption { index: usize, len: usize },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl BotError {
    pub fn user_message(&self) -> String {
        match self {
            BotError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
