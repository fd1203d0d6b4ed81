use serde::{Deserialize, Serialize};

/// Author of a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Bot,
    User,
}

/// A single line in the client-side conversation transcript.
///
/// Bot prompts that expect a choice carry their `options`; everything else
/// is plain text. The transcript is never persisted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
}

impl ChatMessage {
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            options: None,
            question_index: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            options: None,
            question_index: None,
        }
    }

    /// A bot question offering a fixed set of answers.
    pub fn prompt(text: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            options: Some(options),
            ..Self::bot(text)
        }
    }

    pub fn has_options(&self) -> bool {
        self.options.as_ref().is_some_and(|o| !o.is_empty())
    }
}
