use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::splitter::TokenSplitter;
use super::sse::{parse_data_line, DataLine, LineDecoder};
use crate::models::search::{decode_citation_header, Source, CITATION_HEADER};
use crate::providers::utils::error_message;

pub const GENERIC_ERROR_REPLY: &str = "Sorry, something went wrong. Please try again.";

/// What a chat client renders for the assistant's message so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMessageState {
    pub content: String,
    pub think: String,
    pub sources: Vec<Source>,
}

/// Read a chat-completions response the way a chat UI does.
///
/// `on_update` receives the cumulative state after every chunk that changed
/// it. A JSON response is an error payload and becomes a single terminal
/// message. Returns `None` when `cancel` fires; no update is delivered after
/// that point.
pub async fn consume_response<F>(
    response: Response,
    cancel: &CancellationToken,
    mut on_update: F,
) -> Option<ClientMessageState>
where
    F: FnMut(&ClientMessageState),
{
    if is_json(&response) {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            body = response.text() => body.unwrap_or_default(),
        };
        let content = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|payload| error_message(&payload))
            .unwrap_or_else(|| GENERIC_ERROR_REPLY.to_string());

        let state = ClientMessageState {
            content,
            ..Default::default()
        };
        on_update(&state);
        return Some(state);
    }

    let sources = citation_sources(&response);
    let mut state = ClientMessageState {
        sources,
        ..Default::default()
    };
    let mut splitter = TokenSplitter::new();
    let mut decoder = LineDecoder::new();
    let mut body = response.bytes_stream();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("stream aborted by user");
                return None;
            }
            next = body.next() => next,
        };

        let (lines, ended) = match next {
            Some(Ok(chunk)) => (decoder.push(&chunk), false),
            Some(Err(e)) => {
                warn!(error = %e, "stream error");
                break;
            }
            None => (decoder.finish().into_iter().collect(), true),
        };

        let mut changed = false;
        let mut done = false;
        for line in lines {
            match parse_data_line(&line) {
                Some(DataLine::Done) => {
                    done = true;
                    break;
                }
                Some(DataLine::Event(event)) => {
                    if let Some(delta) = event.delta() {
                        splitter = splitter.apply(delta);
                        changed = true;
                    }
                }
                None => {}
            }
        }

        if changed {
            state.content = splitter.answer().to_string();
            state.think = splitter.think().to_string();
            on_update(&state);
        }
        if done || ended {
            break;
        }
    }

    Some(state)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false)
}

fn citation_sources(response: &Response) -> Vec<Source> {
    let Some(value) = response
        .headers()
        .get(CITATION_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return Vec::new();
    };

    decode_citation_header(value).unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable citation header");
        Vec::new()
    })
}
