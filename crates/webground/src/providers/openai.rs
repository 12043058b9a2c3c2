use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use super::base::{CompletionProvider, CompletionRequest, CompletionStream};
use super::configs::OpenAiProviderConfig;
use super::utils::describe_provider_failure;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        // The timeout bounds the wait for response headers, not the stream itself
        let client = Client::builder().build()?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream> {
        let mut builder = self
            .client
            .post(self.url())
            .header(ACCEPT, "text/event-stream")
            .json(request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = tokio::time::timeout(self.config.timeout, builder.send())
            .await
            .map_err(|_| anyhow!("Provider did not respond within {:?}", self.config.timeout))??;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);

        // A JSON body instead of an event stream is an error payload, whatever the status
        if !status.is_success() || is_json {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "provider refused completion");
            return Err(anyhow!(describe_provider_failure(status, &body)));
        }

        Ok(Box::pin(response.bytes_stream().map_err(anyhow::Error::from)))
    }
}
