use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::models::message::ChatMessage;

/// Raw `text/event-stream` body of a completion, chunked however the transport delivers it
pub type CompletionStream = BoxStream<'static, Result<Bytes>>;

/// Downstream request body: `{ model, messages, stream }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl CompletionRequest {
    pub fn streaming<S: Into<String>>(model: S, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
        }
    }
}

/// A hosted model that answers with a chat-completions event stream
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Start the completion. Errors here mean the provider refused or was unreachable;
    /// failures after the first byte surface as stream items instead.
    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() -> Result<()> {
        let request = CompletionRequest::streaming("m", vec![ChatMessage::user("hi")]);
        let value = serde_json::to_value(&request)?;
        assert_eq!(
            value,
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true
            })
        );
        Ok(())
    }
}
