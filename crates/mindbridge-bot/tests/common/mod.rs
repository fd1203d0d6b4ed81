//! Scripted in-memory backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use mindbridge_api::error::ApiError;
use mindbridge_api::sse::StreamEvent;
use mindbridge_bot::backend::{Backend, ChatEvents};
use mindbridge_core::models::child::{Child, NewChild};
use mindbridge_core::models::questionnaire::QuestionnaireSummary;
use mindbridge_core::models::review::{ChatRecord, DiagnosisUpdate, ReviewRow};
use mindbridge_core::models::session::{
    AnswerOutcome, ChatStreamRequest, SessionStart, StartRequest,
};
use mindbridge_core::models::user::{Credentials, Role, User};

pub fn failure() -> ApiError {
    ApiError::Decode("scripted failure".to_string())
}

pub type ScriptedStream = Result<Vec<Result<StreamEvent, ApiError>>, ApiError>;

/// Answers every call from a queue; an empty queue means failure.
/// Every call is recorded by name.
#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<String>>,
    pub starts: Mutex<VecDeque<Result<SessionStart, ApiError>>>,
    pub answers: Mutex<VecDeque<Result<AnswerOutcome, ApiError>>>,
    pub streams: Mutex<VecDeque<ScriptedStream>>,
    pub ends: Mutex<VecDeque<Result<String, ApiError>>>,
    pub chat_requests: Mutex<Vec<ChatStreamRequest>>,
    pub children: Mutex<Vec<Child>>,
    pub added: Mutex<Vec<NewChild>>,
    pub questionnaires: Vec<QuestionnaireSummary>,
    pub rows: Vec<ReviewRow>,
    pub records: Vec<ChatRecord>,
    pub schools: Vec<String>,
    pub reject_diagnosis: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    pub fn script_start(&self, result: Result<SessionStart, ApiError>) {
        self.starts.lock().unwrap().push_back(result);
    }

    pub fn script_answer(&self, result: Result<AnswerOutcome, ApiError>) {
        self.answers.lock().unwrap().push_back(result);
    }

    pub fn script_stream(&self, stream: ScriptedStream) {
        self.streams.lock().unwrap().push_back(stream);
    }

    pub fn script_end(&self, result: Result<String, ApiError>) {
        self.ends.lock().unwrap().push_back(result);
    }
}

pub struct FakeEvents(VecDeque<Result<StreamEvent, ApiError>>);

#[async_trait]
impl ChatEvents for FakeEvents {
    async fn next_event(&mut self) -> Option<Result<StreamEvent, ApiError>> {
        self.0.pop_front()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    type Events = FakeEvents;

    async fn start(&self, _request: &StartRequest) -> Result<SessionStart, ApiError> {
        self.record("start");
        self.starts.lock().unwrap().pop_front().unwrap_or_else(|| Err(failure()))
    }

    async fn answer(
        &self,
        _session_id: &str,
        _answer: &str,
        _answer_index: usize,
    ) -> Result<AnswerOutcome, ApiError> {
        self.record("answer");
        self.answers.lock().unwrap().pop_front().unwrap_or_else(|| Err(failure()))
    }

    async fn end(&self, _session_id: &str, _feedback: &str) -> Result<String, ApiError> {
        self.record("end");
        self.ends.lock().unwrap().pop_front().unwrap_or_else(|| Err(failure()))
    }

    async fn chat_stream(&self, request: &ChatStreamRequest) -> Result<FakeEvents, ApiError> {
        self.record("chat_stream");
        self.chat_requests.lock().unwrap().push(request.clone());
        let scripted = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(failure()));
        scripted.map(|events| FakeEvents(events.into()))
    }

    async fn list_questionnaires(&self) -> Result<Vec<QuestionnaireSummary>, ApiError> {
        self.record("list_questionnaires");
        Ok(self.questionnaires.clone())
    }

    async fn list_children(&self, _role: Role, _mobile: &str) -> Result<Vec<Child>, ApiError> {
        self.record("list_children");
        Ok(self.children.lock().unwrap().clone())
    }

    async fn add_child(&self, _role: Role, child: &NewChild) -> Result<String, ApiError> {
        self.record("add_child");
        let mut added = self.added.lock().unwrap();
        added.push(child.clone());
        Ok(format!("child-{}", added.len()))
    }

    async fn delete_child(&self, _role: Role, _child_id: &str) -> Result<(), ApiError> {
        self.record("delete_child");
        Ok(())
    }

    async fn chat_responses(&self) -> Result<Vec<ReviewRow>, ApiError> {
        self.record("chat_responses");
        Ok(self.rows.clone())
    }

    async fn unique_schools(&self) -> Result<Vec<String>, ApiError> {
        self.record("unique_schools");
        Ok(self.schools.clone())
    }

    async fn chat_record(&self, session_id: &str) -> Result<ChatRecord, ApiError> {
        self.record("chat_record");
        self.records
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned()
            .ok_or_else(failure)
    }

    async fn update_diagnosis(&self, _update: &DiagnosisUpdate) -> Result<(), ApiError> {
        self.record("update_diagnosis");
        if self.reject_diagnosis {
            Err(failure())
        } else {
            Ok(())
        }
    }
}

pub fn credentials(role: Role) -> Credentials {
    Credentials {
        token: "tok".to_string(),
        token_type: "bearer".to_string(),
        user: User {
            mobile: "9990001111".to_string(),
            role,
            name: "Meera".to_string(),
            school: Some("Hillview".to_string()),
        },
        expires_at: None,
    }
}

pub fn review_row(session_id: &str, student: &str, school: &str) -> ReviewRow {
    serde_json::from_value(serde_json::json!({
        "session_id": session_id,
        "student_name": student,
        "school": school,
        "parent_name": "Meera",
    }))
    .unwrap()
}
