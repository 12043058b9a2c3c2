use std::time::Duration;

use async_stream::stream;
use bytes::Bytes;
use futures::Stream;

use super::sse::{format_done, format_event};
use crate::models::stream::StreamEvent;

/// Word-sized pieces of `text`. Every piece but the last keeps its trailing
/// space, so concatenating them gives back `text`.
pub fn split_words(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split(' ').collect();
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i < last {
                format!("{} ", word)
            } else {
                word.to_string()
            }
        })
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Emit a complete answer as if it were being generated: one content event
/// per word, `delay` apart, then `[DONE]`.
pub fn paced_events(text: String, delay: Duration) -> impl Stream<Item = Bytes> + Send + 'static {
    stream! {
        for (i, piece) in split_words(&text).into_iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            yield format_event(&StreamEvent::content(piece));
        }
        yield format_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_split_words_keeps_spaces() {
        assert_eq!(split_words("a bc d"), vec!["a ", "bc ", "d"]);
        assert_eq!(split_words("trailing "), vec!["trailing "]);
        assert_eq!(split_words("two  spaces"), vec!["two ", " ", "spaces"]);
        assert!(split_words("").is_empty());
        assert_eq!(split_words("量子计算 是").concat(), "量子计算 是");
    }

    #[test]
    fn test_empty_text_is_just_done() {
        let events: Vec<Bytes> =
            tokio_test::block_on(paced_events(String::new(), Duration::ZERO).collect());
        assert_eq!(events, vec![format_done()]);
    }

    #[tokio::test]
    async fn test_events_are_spaced_by_delay() {
        let start = std::time::Instant::now();
        let events: Vec<Bytes> = paced_events("one two three".to_string(), Duration::from_millis(20))
            .collect()
            .await;

        assert_eq!(events.len(), 4);
        assert_eq!(events[3], format_done());
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
