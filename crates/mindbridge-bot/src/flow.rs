//! Driving one questionnaire conversation.
//!
//! A [`BotSession`] owns the transcript and the progression state for a
//! single session. The backend decides which question comes next; the
//! session only renders what arrives and sends back what the user chose.
//!
//! Two entry points exist:
//!
//! - [`BotSession::start`] opens a session from a validated form and shows
//!   the first question with its options.
//! - [`BotSession::resume`] attaches to a session created elsewhere. The
//!   conversation then runs entirely over the chat stream, starting with
//!   the [`START_COMMAND`].
//!
//! Once the stream reports the questionnaire complete, the next line of
//! input is treated as feedback and closes the session.

use serde_json::Value;
use tracing::{info, warn};

use mindbridge_core::models::child::age_in_year;
use mindbridge_core::models::session::{
    AnswerOutcome, ChatStreamRequest, DEFAULT_AGE, DEFAULT_MODEL,
};
use mindbridge_core::models::transcript::ChatMessage;
use mindbridge_core::validation::StartForm;

use mindbridge_api::sse::StreamEvent;

use crate::backend::{Backend, ChatEvents};
use crate::error::BotError;
use crate::transcript::Transcript;

pub const START_FAILED: &str =
    "Failed to start questionnaire. Please check your information and try again.";
pub const ANSWER_FAILED: &str = "Failed to submit answer.";
pub const RESPONSE_FAILED: &str = "Failed to get response.";
pub const FEEDBACK_FAILED: &str = "Failed to save feedback.";

/// First message of a resumed, stream-only conversation.
pub const START_COMMAND: &str = "/start";

const COMPLETED: &str = "Thank you for completing the questionnaire!";
const FEEDBACK_SAVED: &str = "Thank you for your feedback!";

/// What the next line of user input means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// A prompt with options is waiting; free text still goes to chat.
    Options,
    /// Free text is sent to the chat stream.
    Chat,
    /// The questionnaire is done; the next text is feedback.
    Feedback,
    /// Feedback was saved. No more input is accepted.
    Closed,
}

pub struct BotSession<'a, B: Backend> {
    backend: &'a B,
    transcript: Transcript,
    session_id: Option<String>,
    options: Vec<String>,
    question_index: usize,
    complete: bool,
    results: Option<Value>,
    mode: InputMode,
    model: String,
    age: Option<i64>,
}

impl<'a, B: Backend> BotSession<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            transcript: Transcript::new(),
            session_id: None,
            options: Vec::new(),
            question_index: 0,
            complete: false,
            results: None,
            mode: InputMode::Chat,
            model: DEFAULT_MODEL.to_string(),
            age: None,
        }
    }

    /// Attach to an existing session. Nothing is sent until the user types.
    pub fn resume(backend: &'a B, session_id: impl Into<String>, student_name: &str) -> Self {
        let mut session = Self::new(backend);
        session.session_id = Some(session_id.into());
        session.transcript.push(ChatMessage::bot(format!(
            "Welcome! Let's begin the test for {student_name}. To start the test, send \"{START_COMMAND}\""
        )));
        session
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the respondent age sent with chat messages. Without this,
    /// the age is derived from the date of birth given at start.
    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Choices offered by the current prompt.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn results(&self) -> Option<&Value> {
        self.results.as_ref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Validate the form and open a session.
    ///
    /// Validation failures return before any request and leave the
    /// transcript alone. On success the transcript is exactly the greeting
    /// followed by the first question.
    pub async fn start(&mut self, form: &StartForm) -> Result<(), BotError> {
        let request = form.validate()?;

        match self.backend.start(&request).await {
            Ok(started) => {
                let mut messages = vec![ChatMessage::bot(format!(
                    "Hello {}! Let's begin the questionnaire.",
                    request.student_name
                ))];
                // Options are only answerable if a message shows them.
                if started.question.is_some() || !started.options.is_empty() {
                    let mut prompt = ChatMessage::prompt(
                        started.question.unwrap_or_default(),
                        started.options.clone(),
                    );
                    prompt.question_index = Some(0);
                    messages.push(prompt);
                }
                self.transcript.reset(messages);

                self.session_id = Some(started.session_id);
                self.options = started.options;
                self.question_index = 0;
                self.complete = false;
                self.results = None;
                self.mode = if self.options.is_empty() {
                    InputMode::Chat
                } else {
                    InputMode::Options
                };
                if self.age.is_none() {
                    let today = jiff::Zoned::now().date();
                    self.age = age_in_year(&request.student_dob, today).ok();
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to start questionnaire");
                self.transcript.reset(vec![ChatMessage::bot(START_FAILED)]);
                self.session_id = None;
                self.options.clear();
                self.mode = InputMode::Chat;
                Err(e.into())
            }
        }
    }

    /// Answer the current prompt with the option at `index`.
    pub async fn choose(&mut self, index: usize) -> Result<(), BotError> {
        if self.complete {
            return Err(BotError::SessionComplete);
        }
        let session_id = self.session_id.clone().ok_or(BotError::NoSession)?;
        let Some(answer) = self.options.get(index).cloned() else {
            return Err(BotError::InvalidOption {
                index,
                len: self.options.len(),
            });
        };

        self.transcript.push(ChatMessage::user(answer.clone()));

        match self.backend.answer(&session_id, &answer, index).await {
            Ok(AnswerOutcome::Next { question, options }) => {
                self.question_index += 1;
                let mut prompt = ChatMessage::prompt(question, options.clone());
                prompt.question_index = Some(self.question_index);
                self.transcript.push(prompt);
                self.mode = if options.is_empty() {
                    InputMode::Chat
                } else {
                    InputMode::Options
                };
                self.options = options;
                Ok(())
            }
            Ok(AnswerOutcome::Complete { question, results }) => {
                info!(session_id = %session_id, "questionnaire complete");
                self.transcript
                    .push(ChatMessage::bot(question.unwrap_or_else(|| COMPLETED.to_string())));
                self.complete = true;
                self.results = results;
                self.options.clear();
                self.mode = InputMode::Chat;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, session_id = %session_id, "failed to submit answer");
                self.transcript.push(ChatMessage::bot(ANSWER_FAILED));
                Err(e.into())
            }
        }
    }

    /// Handle a line of free text according to the current [`InputMode`].
    pub async fn send(&mut self, text: &str) -> Result<(), BotError> {
        match self.mode {
            InputMode::Closed => Err(BotError::SessionComplete),
            InputMode::Feedback => self.submit_feedback(text).await,
            InputMode::Options | InputMode::Chat => self.chat(text).await,
        }
    }

    async fn chat(&mut self, text: &str) -> Result<(), BotError> {
        let session_id = self.session_id.clone().ok_or(BotError::NoSession)?;
        self.transcript.push(ChatMessage::user(text));

        let request = ChatStreamRequest {
            session_id,
            question: text.to_string(),
            model: self.model.clone(),
            age: self.age.unwrap_or(DEFAULT_AGE),
        };
        let mut events = match self.backend.chat_stream(&request).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "chat stream failed to open");
                self.transcript.push(ChatMessage::bot(RESPONSE_FAILED));
                return Err(e.into());
            }
        };

        self.transcript.push(ChatMessage::bot(""));
        while let Some(event) = events.next_event().await {
            match event {
                Ok(StreamEvent::Chunk(chunk)) => {
                    self.transcript.append_to_last(&chunk);
                }
                Ok(StreamEvent::Complete { status, error }) => {
                    if let Some(error) = error {
                        warn!(%error, "chat reply ended with an error");
                        if self.transcript.last().is_some_and(|m| m.text.is_empty()) {
                            self.transcript.append_to_last(&error);
                        }
                    }
                    if status {
                        info!(session_id = %request.session_id, "questionnaire complete");
                        self.complete = true;
                        self.options.clear();
                        self.mode = InputMode::Feedback;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "chat stream interrupted");
                    self.transcript.discard_empty_reply();
                    self.transcript.push(ChatMessage::bot(RESPONSE_FAILED));
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    async fn submit_feedback(&mut self, text: &str) -> Result<(), BotError> {
        let session_id = self.session_id.clone().ok_or(BotError::NoSession)?;
        self.transcript.push(ChatMessage::user(text));

        match self.backend.end(&session_id, text).await {
            Ok(message) => {
                info!(session_id = %session_id, "feedback saved");
                let reply = if message.is_empty() {
                    FEEDBACK_SAVED.to_string()
                } else {
                    message
                };
                self.transcript.push(ChatMessage::bot(reply));
                self.mode = InputMode::Closed;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, session_id = %session_id, "failed to save feedback");
                self.transcript.push(ChatMessage::bot(FEEDBACK_FAILED));
                Err(e.into())
            }
        }
    }
}
