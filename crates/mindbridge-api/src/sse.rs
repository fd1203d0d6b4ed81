//! Incremental decoder for the chat endpoint's server-sent-events body.
//!
//! The body is a sequence of lines; those prefixed `data: ` carry one JSON
//! object each:
//!
//! ```text
//! data: {"chunk": "Hel", "complete": false}
//!
//! data: {"chunk": "lo", "complete": false}
//!
//! data: {"chunk": "", "complete": true, "status": false, "model": "Mistral"}
//! ```
//!
//! Network reads do not respect line boundaries: one read may end in the
//! middle of a record, or in the middle of a multi-byte character. The
//! decoder keeps the unterminated tail as raw bytes and only decodes a line
//! once its `\n` has arrived. Since `\n` never occurs inside a UTF-8
//! sequence, every complete line is a whole number of characters.

use serde::Deserialize;
use tracing::warn;

const DATA_PREFIX: &str = "data: ";

/// A decoded record from the chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text to append to the bot message being streamed.
    Chunk(String),
    /// The server finished this reply. `status` is true once the whole
    /// questionnaire is complete; `error` is set when generation failed.
    Complete { status: bool, error: Option<String> },
}

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default)]
    complete: bool,
    #[serde(default)]
    status: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Line-buffering parse state for one stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    skipped: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next network read. Returns the events completed by it, in
    /// order; bytes after the last newline are held for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            self.decode_line(&line[..newline], &mut events);
        }
        events
    }

    /// Flush a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let line = std::mem::take(&mut self.pending);
        let mut events = Vec::new();
        if !line.is_empty() {
            self.decode_line(&line, &mut events);
        }
        events
    }

    /// Number of `data:` lines dropped because their JSON did not parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bytes buffered while waiting for the end of the current line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn decode_line(&mut self, raw: &[u8], events: &mut Vec<StreamEvent>) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };

        match serde_json::from_str::<Frame>(payload) {
            Ok(frame) => {
                if let Some(chunk) = frame.chunk
                    && !chunk.is_empty()
                {
                    events.push(StreamEvent::Chunk(chunk));
                }
                if frame.complete {
                    events.push(StreamEvent::Complete {
                        status: frame.status,
                        error: frame.error,
                    });
                }
            }
            Err(e) => {
                self.skipped += 1;
                warn!(error = %e, line = %payload, "skipping malformed stream record");
            }
        }
    }
}
