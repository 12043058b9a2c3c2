use std::collections::HashSet;

use anyhow::{anyhow, Result};
use futures::future::join_all;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::configs::SearchConfig;
use super::engines::EngineConfig;
use super::fetch::{truncate_chars, ContentFetcher};
use super::keywords::KeywordExtractor;
use crate::models::search::SearchResult;

/// Queries the configured engines in order, normalizes what they return and
/// enriches the best hits with page text.
pub struct SearchAggregator {
    client: Client,
    config: SearchConfig,
    keywords: KeywordExtractor,
    fetcher: ContentFetcher,
}

impl SearchAggregator {
    pub fn new(config: SearchConfig) -> Result<Self> {
        // Timeouts are set per request: engines and pages have different budgets
        let client = Client::builder().build()?;
        let keywords = KeywordExtractor::new(config.stop_phrases.iter().cloned());
        let fetcher = ContentFetcher::new(client.clone(), config.fetch.clone());

        Ok(Self {
            client,
            config,
            keywords,
            fetcher,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn search_terms(&self, query: &str) -> String {
        self.keywords.extract(query)
    }

    /// When nothing usable is found a single synthetic result pointing at a
    /// public search page is returned, so the list is only ever empty if that
    /// fallback has been disabled.
    pub async fn search(&self, query: &str, cancel: &CancellationToken) -> Vec<SearchResult> {
        let terms = self.search_terms(query);
        info!(terms = %terms, query, "searching the web");

        let raw = self.collect(&terms, cancel).await;
        let raw_count = raw.len();

        let mut seen = HashSet::new();
        let candidates: Vec<SearchResult> = raw
            .into_iter()
            .filter_map(|result| self.normalize(result))
            .filter(|result| seen.insert(result.url.clone()))
            .take(self.config.max_results)
            .collect();

        let mut results = self.enrich(candidates, cancel).await;
        if results.is_empty() {
            if let Some(fallback) = self.fallback_result(&terms) {
                debug!(terms = %terms, "no usable results, using fallback search link");
                results.push(fallback);
            }
        }

        info!(
            terms = %terms,
            raw = raw_count,
            returned = results.len(),
            "search finished"
        );
        results
    }

    async fn collect(&self, terms: &str, cancel: &CancellationToken) -> Vec<SearchResult> {
        let mut results = Vec::new();

        // Sequential on purpose: later engines only run while the quota is unmet
        for engine in &self.config.engines {
            if results.len() >= self.config.result_threshold {
                break;
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("search cancelled");
                    break;
                }
                outcome = self.query_engine(engine, terms) => outcome,
            };

            match outcome {
                Ok(found) => {
                    debug!(engine = engine.engine.as_str(), count = found.len(), "engine answered");
                    results.extend(found);
                }
                Err(e) => {
                    warn!(engine = engine.engine.as_str(), error = %e, "search engine failed");
                }
            }
        }

        results
    }

    async fn query_engine(&self, engine: &EngineConfig, terms: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(&engine.endpoint)
            .query(&engine.engine.query_params(terms))
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(ACCEPT_LANGUAGE, &self.config.accept_language)
            .timeout(self.config.engine_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("{} returned {}", engine.engine.as_str(), status));
        }

        let data: Value = response.json().await?;
        Ok(engine.engine.parse(&data, terms))
    }

    /// Apply the quality floor and the size caps; `None` drops the result
    fn normalize(&self, result: SearchResult) -> Option<SearchResult> {
        let title = result.title.trim();
        let content = result.content.trim();
        if title.chars().count() <= self.config.min_title_chars
            || content.chars().count() <= self.config.min_snippet_chars
        {
            return None;
        }

        let url = Url::parse(result.url.trim())
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))?;

        Some(SearchResult {
            title: title.chars().take(self.config.max_title_chars).collect(),
            url: url.to_string(),
            content: truncate_chars(content, self.config.max_snippet_chars),
        })
    }

    async fn enrich(
        &self,
        results: Vec<SearchResult>,
        cancel: &CancellationToken,
    ) -> Vec<SearchResult> {
        join_all(
            results
                .into_iter()
                .map(|result| self.enrich_one(result, cancel)),
        )
        .await
    }

    async fn enrich_one(&self, result: SearchResult, cancel: &CancellationToken) -> SearchResult {
        if self
            .config
            .skip_enrichment
            .iter()
            .any(|pattern| result.url.contains(pattern.as_str()))
        {
            return result;
        }

        debug!(url = %result.url, "fetching page content");
        let page = self.fetcher.fetch(&result.url, cancel).await;
        match page.text() {
            Some(text) if text.chars().count() > self.config.min_enriched_chars => SearchResult {
                content: text.to_string(),
                ..result
            },
            _ => {
                debug!(url = %result.url, outcome = %page, "keeping search snippet");
                result
            }
        }
    }

    pub fn fallback_result(&self, terms: &str) -> Option<SearchResult> {
        let base = self.config.fallback_search_url.as_deref()?;
        Some(SearchResult::new(
            format!("关于\"{}\"的搜索", terms),
            format!("{}{}", base, urlencoding::encode(terms)),
            "未找到相关结果，建议您访问搜索引擎获取更多信息。",
        ))
    }
}
