use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A questionnaire as listed by the catalogue endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireSummary {
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A full questionnaire definition. Read-only from the client's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    #[serde(rename = "questionnaire", alias = "name")]
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Questionnaire {
    /// Split questions into `(regular, follow_up)`. Questions of any other
    /// kind land in neither list.
    pub fn partition(&self) -> (Vec<&Question>, Vec<&Question>) {
        let regular = self
            .questions
            .iter()
            .filter(|q| q.kind == Some(QuestionKind::Regular))
            .collect();
        let follow_up = self
            .questions
            .iter()
            .filter(|q| q.kind == Some(QuestionKind::FollowUp))
            .collect();
        (regular, follow_up)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question", alias = "text")]
    pub text: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionKind>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// The `type` field of a question.
///
/// `0` marks a follow-up (asked only after a prior "Yes"), `1` a regular
/// question; both may arrive as numbers or strings. Anything else is a
/// free-form input kind such as `"scale"` or `"multiple_choice"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    FollowUp,
    Regular,
    Named(String),
}

impl QuestionKind {
    pub fn label(&self) -> &str {
        match self {
            QuestionKind::FollowUp => "Follow-up",
            QuestionKind::Regular => "Regular",
            QuestionKind::Named(name) => name,
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKind {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for QuestionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let kind = match RawKind::deserialize(deserializer)? {
            RawKind::Number(0) => QuestionKind::FollowUp,
            RawKind::Number(1) => QuestionKind::Regular,
            RawKind::Number(n) => QuestionKind::Named(n.to_string()),
            RawKind::Text(s) => match s.trim() {
                "0" => QuestionKind::FollowUp,
                "1" => QuestionKind::Regular,
                other => QuestionKind::Named(other.to_lowercase()),
            },
        };
        Ok(kind)
    }
}

impl Serialize for QuestionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QuestionKind::FollowUp => serializer.serialize_u8(0),
            QuestionKind::Regular => serializer.serialize_u8(1),
            QuestionKind::Named(name) => serializer.serialize_str(name),
        }
    }
}

/// Audience a questionnaire is activated for via `set_questionnaire_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Parent,
    Child,
    Teacher,
}
