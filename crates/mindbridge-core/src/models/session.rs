use serde::{Deserialize, Serialize};

/// Model the backend falls back to when a chat request names none.
pub const DEFAULT_MODEL: &str = "Mistral";

/// Age sent with chat requests when the respondent's age is unknown.
pub const DEFAULT_AGE: i64 = 15;

/// Who is answering on the child's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "name", rename_all = "snake_case")]
pub enum Guardian {
    Parent(String),
    Teacher(String),
}

/// Body of `POST /api/questionnaire/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    pub student_name: String,
    pub student_dob: String,
    pub student_gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    pub questionnaire_name: String,
    pub tnc_accepted: bool,
}

impl StartRequest {
    pub fn guardian(&self) -> Option<Guardian> {
        match (&self.teacher_name, &self.parent_name) {
            (Some(teacher), _) => Some(Guardian::Teacher(teacher.clone())),
            (None, Some(parent)) => Some(Guardian::Parent(parent.clone())),
            (None, None) => None,
        }
    }
}

/// Response of `POST /api/questionnaire/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStart {
    pub session_id: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Body of `POST /api/questionnaire/answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub session_id: String,
    pub answer: String,
    pub answer_index: usize,
}

/// What the backend decided after an answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawAnswerOutcome")]
pub enum AnswerOutcome {
    Next {
        question: String,
        options: Vec<String>,
    },
    Complete {
        question: Option<String>,
        results: Option<serde_json::Value>,
    },
}

impl AnswerOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, AnswerOutcome::Complete { .. })
    }
}

#[derive(Deserialize)]
struct RawAnswerOutcome {
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    results: Option<serde_json::Value>,
}

impl From<RawAnswerOutcome> for AnswerOutcome {
    fn from(raw: RawAnswerOutcome) -> Self {
        if raw.is_complete {
            AnswerOutcome::Complete {
                question: raw.question,
                results: raw.results,
            }
        } else {
            AnswerOutcome::Next {
                question: raw.question.unwrap_or_default(),
                options: raw.options,
            }
        }
    }
}

/// Body of `POST /api/chat/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStreamRequest {
    pub session_id: String,
    pub question: String,
    pub model: String,
    pub age: i64,
}

/// Body of `POST /api/questionnaire/end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndRequest {
    pub session_id: String,
    pub feedback: String,
}
