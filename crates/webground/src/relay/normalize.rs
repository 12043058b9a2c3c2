use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::sse::{format_done, format_event, parse_data_line, DataLine, LineDecoder};
use crate::models::stream::StreamEvent;
use crate::providers::base::CompletionStream;

/// Relay a provider's event stream in the normalized envelope.
///
/// Only the content and reasoning tokens of the first choice survive. Events
/// without either are dropped, malformed lines are skipped, and the output
/// always ends with exactly one `[DONE]`, even when the provider fails
/// mid-stream or closes without one. Cancellation ends the stream at once.
pub fn normalize_stream(
    mut upstream: CompletionStream,
    cancel: CancellationToken,
) -> impl Stream<Item = Bytes> + Send + 'static {
    stream! {
        let mut decoder = LineDecoder::new();
        let mut relayed = 0usize;

        'read: loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(relayed, "relay cancelled");
                    return;
                }
                next = upstream.next() => next,
            };

            let (lines, ended) = match next {
                Some(Ok(chunk)) => (decoder.push(&chunk), false),
                Some(Err(e)) => {
                    warn!(error = %e, relayed, "provider stream failed");
                    break 'read;
                }
                None => (decoder.finish().into_iter().collect(), true),
            };

            for line in lines {
                match parse_data_line(&line) {
                    Some(DataLine::Done) => break 'read,
                    Some(DataLine::Event(event)) => {
                        if let Some(delta) = event.delta().filter(|delta| !delta.is_empty()) {
                            relayed += 1;
                            yield format_event(&StreamEvent::from_delta(delta.clone()));
                        }
                    }
                    None => {}
                }
            }

            if ended {
                break;
            }
        }

        debug!(relayed, "relay finished");
        yield format_done();
    }
}
