//! The seam between the conversation driver and the HTTP client.

use async_trait::async_trait;

use mindbridge_api::chat::ChatStream;
use mindbridge_api::client::ApiClient;
use mindbridge_api::error::ApiError;
use mindbridge_api::sse::StreamEvent;
use mindbridge_api::{catalog, chat, children, review, session};
use mindbridge_core::models::child::{Child, NewChild};
use mindbridge_core::models::questionnaire::QuestionnaireSummary;
use mindbridge_core::models::review::{ChatRecord, DiagnosisUpdate, ReviewRow};
use mindbridge_core::models::session::{
    AnswerOutcome, ChatStreamRequest, SessionStart, StartRequest,
};
use mindbridge_core::models::user::Role;

/// A source of decoded chat-stream events.
#[async_trait]
pub trait ChatEvents: Send {
    /// Next event, or `None` once the reply is over.
    async fn next_event(&mut self) -> Option<Result<StreamEvent, ApiError>>;
}

#[async_trait]
impl ChatEvents for ChatStream {
    async fn next_event(&mut self) -> Option<Result<StreamEvent, ApiError>> {
        ChatStream::next_event(self).await
    }
}

/// Backend operations the driver and store need.
#[async_trait]
pub trait Backend: Send + Sync {
    type Events: ChatEvents;

    async fn start(&self, request: &StartRequest) -> Result<SessionStart, ApiError>;

    async fn answer(
        &self,
        session_id: &str,
        answer: &str,
        answer_index: usize,
    ) -> Result<AnswerOutcome, ApiError>;

    /// Close the session with feedback; returns the server's acknowledgement.
    async fn end(&self, session_id: &str, feedback: &str) -> Result<String, ApiError>;

    async fn chat_stream(&self, request: &ChatStreamRequest) -> Result<Self::Events, ApiError>;

    async fn list_questionnaires(&self) -> Result<Vec<QuestionnaireSummary>, ApiError>;

    async fn list_children(&self, role: Role, mobile: &str) -> Result<Vec<Child>, ApiError>;

    /// Returns the id the server assigned.
    async fn add_child(&self, role: Role, child: &NewChild) -> Result<String, ApiError>;

    async fn delete_child(&self, role: Role, child_id: &str) -> Result<(), ApiError>;

    async fn chat_responses(&self) -> Result<Vec<ReviewRow>, ApiError>;

    async fn unique_schools(&self) -> Result<Vec<String>, ApiError>;

    async fn chat_record(&self, session_id: &str) -> Result<ChatRecord, ApiError>;

    async fn update_diagnosis(&self, update: &DiagnosisUpdate) -> Result<(), ApiError>;
}

#[async_trait]
impl Backend for ApiClient {
    type Events = ChatStream;

    async fn start(&self, request: &StartRequest) -> Result<SessionStart, ApiError> {
        session::start(self, request).await
    }

    async fn answer(
        &self,
        session_id: &str,
        answer: &str,
        answer_index: usize,
    ) -> Result<AnswerOutcome, ApiError> {
        session::answer(self, session_id, answer, answer_index).await
    }

    async fn end(&self, session_id: &str, feedback: &str) -> Result<String, ApiError> {
        Ok(session::end(self, session_id, feedback).await?.message)
    }

    async fn chat_stream(&self, request: &ChatStreamRequest) -> Result<ChatStream, ApiError> {
        chat::chat_stream(self, request).await
    }

    async fn list_questionnaires(&self) -> Result<Vec<QuestionnaireSummary>, ApiError> {
        catalog::list_questionnaires(self).await
    }

    async fn list_children(&self, role: Role, mobile: &str) -> Result<Vec<Child>, ApiError> {
        children::list_children(self, role, mobile).await
    }

    async fn add_child(&self, role: Role, child: &NewChild) -> Result<String, ApiError> {
        Ok(children::add_child(self, role, child).await?.child_id)
    }

    async fn delete_child(&self, role: Role, child_id: &str) -> Result<(), ApiError> {
        children::delete_child(self, role, child_id).await?;
        Ok(())
    }

    async fn chat_responses(&self) -> Result<Vec<ReviewRow>, ApiError> {
        review::chat_responses(self).await
    }

    async fn unique_schools(&self) -> Result<Vec<String>, ApiError> {
        review::unique_schools(self).await
    }

    async fn chat_record(&self, session_id: &str) -> Result<ChatRecord, ApiError> {
        review::chat_record(self, session_id).await
    }

    async fn update_diagnosis(&self, update: &DiagnosisUpdate) -> Result<(), ApiError> {
        review::update_diagnosis(self, update).await?;
        Ok(())
    }
}
