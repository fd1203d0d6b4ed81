//! Terminal loop for a bot session.
//!
//! Numbers answer the current prompt while one is open; any other text is
//! sent to the chat stream, or saved as feedback once the questionnaire is
//! complete. `/quit` leaves without closing the session.

use std::io::Write;

use eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use mindbridge_bot::backend::Backend;
use mindbridge_bot::error::BotError;
use mindbridge_bot::flow::{BotSession, InputMode};
use mindbridge_bot::transcript::Transcript;
use mindbridge_core::models::transcript::Sender;

/// Print bot messages from index `from` on. Returns the new count.
pub fn render_new(transcript: &Transcript, from: usize) -> usize {
    for message in transcript.messages().iter().skip(from) {
        if message.sender == Sender::User {
            continue;
        }
        println!("bot> {}", message.text);
        if message.has_options() {
            for (i, option) in message.options.iter().flatten().enumerate() {
                println!("  {}) {option}", i + 1);
            }
        }
    }
    transcript.len()
}

pub async fn drive<B: Backend>(session: &mut BotSession<'_, B>) -> Result<()> {
    let shown = render_new(session.transcript(), 0);
    drive_from(session, shown).await
}

pub async fn drive_from<B: Backend>(
    session: &mut BotSession<'_, B>,
    mut shown: usize,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while session.mode() != InputMode::Closed {
        prompt(session.mode())?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        let result = match (session.mode(), line.parse::<usize>()) {
            (InputMode::Options, Ok(number)) => match number.checked_sub(1) {
                Some(index) => session.choose(index).await,
                None => Err(BotError::InvalidOption {
                    index: 0,
                    len: session.options().len(),
                }),
            },
            _ => session.send(line).await,
        };
        shown = render_new(session.transcript(), shown);

        match result {
            Ok(()) => {}
            Err(BotError::InvalidOption { len, .. }) => {
                eprintln!("Choose a number between 1 and {len}");
            }
            // Already reported in the transcript.
            Err(BotError::Api(e)) => warn!(error = %e, "request failed"),
            Err(e) => eprintln!("{}", e.user_message()),
        }
    }

    if let Some(results) = session.results() {
        println!("\nResults:\n{}", serde_json::to_string_pretty(results)?);
    }
    Ok(())
}

fn prompt(mode: InputMode) -> Result<()> {
    let label = match mode {
        InputMode::Options => "choice or message",
        InputMode::Chat => "message",
        InputMode::Feedback => "feedback",
        InputMode::Closed => return Ok(()),
    };
    print!("{label}> ");
    std::io::stdout().flush()?;
    Ok(())
}
