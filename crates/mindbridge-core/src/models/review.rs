use serde::{Deserialize, Serialize};

/// One completed or in-progress session as listed for psychologist review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub session_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    // The backend spells these keys "gaurdian_*".
    #[serde(default, alias = "gaurdian_role", skip_serializing_if = "Option::is_none")]
    pub guardian_role: Option<String>,
    #[serde(default, alias = "gaurdian_name", skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questionnaire_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
}

impl ReviewRow {
    pub fn is_diagnosed(&self) -> bool {
        self.diagnosis.as_deref().is_some_and(|d| !d.trim().is_empty())
    }
}

/// Full stored conversation for a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub session_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questionnaire_name: Option<String>,
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
}

/// A stored exchange. Bot turns record which questionnaire item they asked;
/// negative indices are the backend's "please elaborate" probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_index: Option<i64>,
}

/// Body of `POST /api/psychologist/update-diagnosis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisUpdate {
    pub session_id: String,
    pub diagnosis: String,
}
