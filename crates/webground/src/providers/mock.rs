use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::sync::Arc;
use std::sync::Mutex;

use crate::providers::base::{CompletionProvider, CompletionRequest, CompletionStream};

/// A mock provider that replays pre-configured stream chunks and records what it was asked
pub struct MockProvider {
    chunks: Vec<String>,
    failure: Option<String>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider whose stream yields `chunks` verbatim
    pub fn new<S: Into<String>>(chunks: Vec<S>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider that refuses every request with `message`
    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(Vec::<String>::new())
        }
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }

        let chunks: Vec<Result<Bytes>> = self
            .chunks
            .iter()
            .map(|chunk| Ok(Bytes::from(chunk.clone())))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}
