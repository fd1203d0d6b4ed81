use tracing::info;

use mindbridge_core::models::session::{
    AnswerOutcome, AnswerRequest, EndRequest, SessionStart, StartRequest,
};

use crate::auth::MessageResponse;
use crate::client::ApiClient;
use crate::error::ApiError;

/// Open a questionnaire session for a child.
pub async fn start(client: &ApiClient, request: &StartRequest) -> Result<SessionStart, ApiError> {
    info!(
        student = %request.student_name,
        questionnaire = %request.questionnaire_name,
        "starting questionnaire session"
    );
    let started: SessionStart = client
        .post_json(&["api", "questionnaire", "start"], request)
        .await?;
    info!(session_id = %started.session_id, "session started");
    Ok(started)
}

/// Submit the chosen option for the current question.
///
/// There is no idempotency key: resubmitting after a lost response may
/// record the answer twice, depending on the backend.
pub async fn answer(
    client: &ApiClient,
    session_id: &str,
    answer: &str,
    answer_index: usize,
) -> Result<AnswerOutcome, ApiError> {
    let request = AnswerRequest {
        session_id: session_id.to_string(),
        answer: answer.to_string(),
        answer_index,
    };
    let outcome: AnswerOutcome = client
        .post_json(&["api", "questionnaire", "answer"], &request)
        .await?;
    info!(session_id, answer_index, complete = outcome.is_complete(), "answer submitted");
    Ok(outcome)
}

/// Close a session with free-text feedback.
pub async fn end(
    client: &ApiClient,
    session_id: &str,
    feedback: &str,
) -> Result<MessageResponse, ApiError> {
    let request = EndRequest {
        session_id: session_id.to_string(),
        feedback: feedback.to_string(),
    };
    client
        .post_json(&["api", "questionnaire", "end"], &request)
        .await
}
