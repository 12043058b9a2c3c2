use bytes::Bytes;
use tracing::warn;

use crate::models::stream::StreamEvent;

pub const DONE_EVENT: &str = "data: [DONE]\n\n";

/// Re-frames a byte stream into lines. A line may arrive split across any
/// number of chunks, including in the middle of a UTF-8 sequence.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete, non-blank lines made available by `chunk`
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            if let Some(line) = decode_line(&raw[..end]) {
                lines.push(line);
            }
        }
        lines
    }

    /// Whatever is left once the stream has ended without a final newline
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataLine {
    Event(StreamEvent),
    Done,
}

/// Interpret one event-stream line. Comments, other fields and malformed
/// payloads yield `None`; only the latter are worth a warning.
pub fn parse_data_line(line: &str) -> Option<DataLine> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == "[DONE]" {
        return Some(DataLine::Done);
    }

    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(DataLine::Event(event)),
        Err(e) => {
            warn!(error = %e, line = payload, "skipping malformed stream chunk");
            None
        }
    }
}

pub fn format_event(event: &StreamEvent) -> Bytes {
    let encoded = serde_json::to_string(event).unwrap_or_else(|_| String::from("{}"));
    Bytes::from(format!("data: {}\n\n", encoded))
}

pub fn format_done() -> Bytes {
    Bytes::from_static(DONE_EVENT.as_bytes())
}
