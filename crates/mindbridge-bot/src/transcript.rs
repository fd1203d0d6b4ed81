use mindbridge_core::models::transcript::{ChatMessage, Sender};

/// Append-only list of conversation lines, oldest first.
///
/// The only in-place edit is [`Transcript::append_to_last`], used while a
/// streamed reply is arriving.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replace the whole conversation.
    pub fn reset(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Extend the text of the last message if it came from the bot.
    /// Returns false when there is no such message.
    pub fn append_to_last(&mut self, chunk: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.sender == Sender::Bot => {
                last.text.push_str(chunk);
                true
            }
            _ => false,
        }
    }

    /// Drop a trailing bot message that never received any text.
    pub fn discard_empty_reply(&mut self) {
        if self
            .messages
            .last()
            .is_some_and(|m| m.sender == Sender::Bot && m.text.is_empty())
        {
            self.messages.pop();
        }
    }
}
