use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use super::base::{CompletionProvider, CompletionRequest, CompletionStream};
use super::configs::CannedProviderConfig;
use crate::relay::pacing::paced_events;

/// Answers locally with a fixed reply, streamed word by word
pub struct CannedProvider {
    config: CannedProviderConfig,
}

impl CannedProvider {
    pub fn new(config: CannedProviderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CompletionProvider for CannedProvider {
    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream> {
        debug!(model = %request.model, messages = request.messages.len(), "serving canned reply");
        let events = paced_events(self.config.reply.clone(), self.config.chunk_delay);
        Ok(Box::pin(events.map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::ChatMessage;
    use std::time::Duration;

    #[tokio::test]
    async fn test_canned_reply_is_a_paced_event_stream() -> Result<()> {
        let provider = CannedProvider::new(CannedProviderConfig {
            reply: "Hello brave world".to_string(),
            chunk_delay: Duration::ZERO,
        });

        let request = CompletionRequest::streaming("m", vec![ChatMessage::user("hi")]);
        let chunks: Vec<_> = provider.stream(&request).await?.collect().await;
        let body: String = chunks
            .into_iter()
            .map(|chunk| String::from_utf8(chunk.unwrap().to_vec()).unwrap())
            .collect();

        assert_eq!(
            body,
            concat!(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hello \"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"brave \"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"world\"}}]}\n\n",
                "data: [DONE]\n\n"
            )
        );
        Ok(())
    }
}
