use std::sync::Arc;

use anyhow::{bail, Result};
use bytes::Bytes;
use chrono::Local;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{RelayError, RelayResult};
use crate::models::message::{ChatMessage, ChatRequest, Role};
use crate::models::search::{encode_citation_header, ProcessedContent, SearchResult};
use crate::prompt::{assemble_prompt, degraded_prompt};
use crate::providers::base::{CompletionProvider, CompletionRequest};
use crate::relay::normalize_stream;
use crate::search::SearchAggregator;

pub const DEFAULT_MODEL: &str = "@tx/deepseek-ai/deepseek-r1-distill-qwen-32b";

pub const DEFAULT_ALLOWED_MODELS: [&str; 3] = [
    "@tx/deepseek-ai/deepseek-r1-distill-qwen-32b",
    "@tx/deepseek-ai/deepseek-r1-0528",
    "@tx/deepseek-ai/deepseek-v3-0324",
];

/// The models a client may ask for, and the one used when it does not ask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPolicy {
    allowed: Vec<String>,
    default: String,
}

impl ModelPolicy {
    pub fn new<S: Into<String>>(allowed: Vec<String>, default: S) -> Result<Self> {
        let default = default.into();
        if !allowed.contains(&default) {
            bail!(
                "default model {} is not one of the allowed models ({})",
                default,
                allowed.join(", ")
            );
        }
        Ok(Self { allowed, default })
    }

    pub fn resolve(&self, requested: Option<&str>) -> RelayResult<String> {
        let model = requested.unwrap_or(&self.default);
        if self.allowed.iter().any(|allowed| allowed == model) {
            Ok(model.to_string())
        } else {
            Err(RelayError::UnknownModel {
                model: model.to_string(),
                allowed: self.allowed.clone(),
            })
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn default_model(&self) -> &str {
        &self.default
    }
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_MODELS.iter().map(|m| m.to_string()).collect(),
            default: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Parse an inbound body. Every failure is a validation error so the caller
/// always gets a structured answer.
pub fn parse_request(body: &[u8]) -> RelayResult<ChatRequest> {
    let request: ChatRequest = serde_json::from_slice(body)
        .map_err(|e| RelayError::Validation(format!("Invalid request body: {}", e)))?;
    if request.messages.is_empty() {
        return Err(RelayError::Validation(
            "messages must not be empty".to_string(),
        ));
    }
    Ok(request)
}

/// A started completion: the citations gathered for it and the normalized
/// event stream to relay to the client.
pub struct RelayResponse {
    pub sources: Vec<SearchResult>,
    pub stream: BoxStream<'static, Bytes>,
}

impl RelayResponse {
    pub fn citation_header(&self) -> String {
        encode_citation_header(&self.sources)
    }
}

pub struct ChatOrchestrator {
    provider: Arc<dyn CompletionProvider>,
    aggregator: SearchAggregator,
    models: ModelPolicy,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        aggregator: SearchAggregator,
        models: ModelPolicy,
    ) -> Self {
        Self {
            provider,
            aggregator,
            models,
        }
    }

    pub fn models(&self) -> &ModelPolicy {
        &self.models
    }

    /// Augment `input` with web search results when `network` is on.
    ///
    /// Search failures never surface here. When nothing at all is found the
    /// input is returned with a note saying so.
    pub async fn process_content(
        &self,
        input: &str,
        network: bool,
        cancel: &CancellationToken,
    ) -> RelayResult<ProcessedContent> {
        if !network {
            return Ok(ProcessedContent::passthrough(input));
        }

        let results = self.aggregator.search(input, cancel).await;
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }

        if results.is_empty() {
            warn!("no search results, answering without web context");
            return Ok(ProcessedContent::passthrough(degraded_prompt(input)));
        }

        let today = Local::now().date_naive();
        let content = assemble_prompt(input, &results, today)
            .map_err(|e| RelayError::Template(e.to_string()))?;

        Ok(ProcessedContent {
            content,
            search_results: results,
        })
    }

    /// Validate `request` and build the downstream completion request along
    /// with the citations collected for it.
    pub async fn prepare(
        &self,
        request: ChatRequest,
        cancel: &CancellationToken,
    ) -> RelayResult<(CompletionRequest, Vec<SearchResult>)> {
        // Checked first so a rejected request never reaches a search engine
        let model = self.models.resolve(request.model.as_deref())?;
        let network = request.uses_network();
        let input = request
            .current_input()
            .ok_or(RelayError::MissingInput)?
            .to_string();

        let processed = self.process_content(&input, network, cancel).await?;

        let mut messages = request.messages;
        if let Some(last) = messages.last_mut() {
            *last = ChatMessage::new(Role::User, processed.content);
        }

        info!(
            model = %model,
            network,
            messages = messages.len(),
            sources = processed.search_results.len(),
            "forwarding chat request"
        );
        Ok((
            CompletionRequest::streaming(model, messages),
            processed.search_results,
        ))
    }

    pub async fn respond(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> RelayResult<RelayResponse> {
        let (completion, sources) = self.prepare(request, &cancel).await?;

        let upstream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("request cancelled before the provider answered");
                return Err(RelayError::Cancelled);
            }
            upstream = self.provider.stream(&completion) => upstream,
        }
        .map_err(|e| {
            warn!(error = %e, model = %completion.model, "completion provider failed");
            RelayError::Provider(e.to_string())
        })?;

        Ok(RelayResponse {
            sources,
            stream: Box::pin(normalize_stream(upstream, cancel)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::search::decode_citation_header;
    use crate::providers::mock::MockProvider;
    use crate::search::{EngineConfig, SearchConfig, SearchEngine};
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REPLY: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\ndata: [DONE]\n\n";

    fn offline_search() -> SearchAggregator {
        SearchAggregator::new(SearchConfig {
            engines: Vec::new(),
            ..SearchConfig::default()
        })
        .unwrap()
    }

    fn orchestrator(provider: MockProvider, aggregator: SearchAggregator) -> ChatOrchestrator {
        ChatOrchestrator::new(Arc::new(provider), aggregator, ModelPolicy::default())
    }

    #[tokio::test]
    async fn test_network_off_passes_input_through() {
        let orchestrator = orchestrator(MockProvider::new(vec![REPLY]), offline_search());

        let processed = orchestrator
            .process_content("什么是量子计算", false, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(processed.content, "什么是量子计算");
        assert!(processed.search_results.is_empty());
    }

    #[tokio::test]
    async fn test_network_on_rewrites_last_message_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "title": "量子计算 - 维基百科",
                    "url": "https://zh.wikipedia.org/wiki/量子计算",
                    "content": "量子计算是一种遵循量子力学规律调控量子信息单元进行计算的新型计算模式。"
                }]
            })))
            .mount(&server)
            .await;
        let aggregator = SearchAggregator::new(SearchConfig {
            engines: vec![EngineConfig::with_endpoint(
                SearchEngine::Searxng,
                format!("{}/search", server.uri()),
            )],
            ..SearchConfig::default()
        })
        .unwrap();

        let provider = MockProvider::new(vec![REPLY]);
        let requests = provider.requests();
        let orchestrator = orchestrator(provider, aggregator);

        let request = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("什么是量子计算"),
        ])
        .with_network(true);

        let response = orchestrator
            .respond(request, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.sources.len(), 1);
        let header = decode_citation_header(&response.citation_header()).unwrap();
        assert_eq!(header[0].title, "量子计算 - 维基百科");

        let sent = requests.lock().unwrap()[0].clone();
        assert_eq!(sent.model, DEFAULT_MODEL);
        assert!(sent.stream);
        assert_eq!(sent.messages[0], ChatMessage::system("be brief"));
        assert_eq!(sent.messages[1], ChatMessage::assistant("hello"));
        assert_eq!(sent.messages[2].role, Role::User);
        assert!(sent.messages[2].content.contains("[webpage 1 begin]"));
        assert!(sent.messages[2].content.contains("什么是量子计算"));
    }

    #[tokio::test]
    async fn test_empty_search_degrades_to_input_with_note() {
        let aggregator = SearchAggregator::new(SearchConfig {
            engines: Vec::new(),
            fallback_search_url: None,
            ..SearchConfig::default()
        })
        .unwrap();
        let orchestrator = orchestrator(MockProvider::new(vec![REPLY]), aggregator);

        let processed = orchestrator
            .process_content("今天北京天气", true, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(processed.content, "今天北京天气\n\n[搜索未找到相关结果]");
        assert!(processed.search_results.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_result_becomes_citation() {
        let orchestrator = orchestrator(MockProvider::new(vec![REPLY]), offline_search());

        let processed = orchestrator
            .process_content("今天北京天气", true, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(processed.search_results.len(), 1);
        assert!(processed.search_results[0]
            .url
            .starts_with("https://www.baidu.com/s?wd="));
    }

    #[tokio::test]
    async fn test_unknown_model_is_rejected_before_provider_call() {
        let provider = MockProvider::new(vec![REPLY]);
        let requests = provider.requests();
        let orchestrator = orchestrator(provider, offline_search());

        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).with_model("gpt-4o");
        let err = orchestrator
            .respond(request, CancellationToken::new())
            .await
            .err()
            .unwrap();

        assert!(matches!(err, RelayError::UnknownModel { ref model, .. } if model == "gpt-4o"));
        assert!(err.to_string().contains("@tx/deepseek-ai/deepseek-v3-0324"));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_input() {
        let orchestrator = orchestrator(MockProvider::new(vec![REPLY]), offline_search());
        let request = ChatRequest::new(vec![ChatMessage::user("")]);

        let err = orchestrator
            .respond(request, CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert_eq!(err, RelayError::MissingInput);
    }

    #[tokio::test]
    async fn test_provider_failure_is_surfaced() {
        let orchestrator = orchestrator(MockProvider::failing("upstream quota exceeded"), offline_search());
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]);

        let err = orchestrator
            .respond(request, CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert_eq!(err, RelayError::Provider("upstream quota exceeded".to_string()));
    }

    #[tokio::test]
    async fn test_respond_streams_normalized_events() {
        let orchestrator = orchestrator(
            MockProvider::new(vec!["data: {\"id\":\"x\",\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n"]),
            offline_search(),
        );
        let request = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_model("@tx/deepseek-ai/deepseek-r1-0528");

        let response = orchestrator
            .respond(request, CancellationToken::new())
            .await
            .unwrap();
        assert!(response.sources.is_empty());
        assert_eq!(response.citation_header(), "[]");

        let body: Vec<Bytes> = response.stream.collect().await;
        assert_eq!(body.concat(), REPLY.as_bytes());
    }

    #[tokio::test]
    async fn test_cancelled_request_does_not_reach_provider() {
        let provider = MockProvider::new(vec![REPLY]);
        let requests = provider.requests();
        let orchestrator = orchestrator(provider, offline_search());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).with_network(true);

        let err = orchestrator.respond(request, cancel).await.err().unwrap();
        assert_eq!(err, RelayError::Cancelled);
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parse_request() {
        let request = parse_request(
            br#"{"messages":[{"role":"user","content":"hi"}],"network":true,"extra":1}"#,
        )
        .unwrap();
        assert!(request.uses_network());

        assert!(matches!(
            parse_request(br#"{"messages":[]}"#),
            Err(RelayError::Validation(_))
        ));
        assert!(matches!(parse_request(b"not json"), Err(RelayError::Validation(_))));
        assert!(matches!(
            parse_request(br#"{"messages":[{"role":"tool","content":"x"}]}"#),
            Err(RelayError::Validation(_))
        ));
    }

    #[test]
    fn test_model_policy() {
        let policy = ModelPolicy::default();
        assert_eq!(policy.resolve(None).unwrap(), DEFAULT_MODEL);
        assert!(policy.resolve(Some("nope")).is_err());
        assert!(ModelPolicy::new(vec!["a".to_string()], "b").is_err());
    }
}
