use std::collections::VecDeque;

use reqwest::{Method, Response};
use tracing::info;

use mindbridge_core::models::session::ChatStreamRequest;

use crate::client::{ApiClient, check_status};
use crate::error::ApiError;
use crate::sse::{SseDecoder, StreamEvent};

/// An open chat reply stream.
///
/// Pull events with [`ChatStream::next_event`] until it returns `None`.
/// The stream ends at the first `Complete` record or when the server closes
/// the body, whichever comes first.
pub struct ChatStream {
    response: Response,
    decoder: SseDecoder,
    ready: VecDeque<StreamEvent>,
    finished: bool,
}

impl ChatStream {
    fn new(response: Response) -> Self {
        Self {
            response,
            decoder: SseDecoder::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, ApiError>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                if matches!(event, StreamEvent::Complete { .. }) {
                    self.finished = true;
                    self.ready.clear();
                }
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }

            match self.response.chunk().await {
                Ok(Some(bytes)) => self.ready.extend(self.decoder.feed(&bytes)),
                Ok(None) => {
                    // Flushed events still drain before `finished` is seen.
                    self.ready.extend(self.decoder.finish());
                    self.finished = true;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }

    /// Records dropped so far because they were not valid JSON.
    pub fn skipped(&self) -> usize {
        self.decoder.skipped()
    }
}

/// Post a free-text message and open the streamed reply.
pub async fn chat_stream(
    client: &ApiClient,
    request: &ChatStreamRequest,
) -> Result<ChatStream, ApiError> {
    info!(session_id = %request.session_id, model = %request.model, "opening chat stream");

    let response = client
        .request(Method::POST, &["api", "chat", "stream"])
        .json(request)
        .send()
        .await?;
    let response = check_status(response).await?;

    Ok(ChatStream::new(response))
}
