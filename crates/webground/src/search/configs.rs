use std::time::Duration;

use super::engines::{EngineConfig, SearchEngine};
use super::keywords::DEFAULT_STOP_PHRASES;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Web page fetching limits
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_chars: usize,
    /// Download cap; the rest of a larger page is never read
    pub max_bytes: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            max_chars: 1500,
            max_bytes: 1024 * 1024,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Everything the aggregator needs; built once at startup and shared by every request
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Queried in order until `result_threshold` raw results are collected
    pub engines: Vec<EngineConfig>,
    pub stop_phrases: Vec<String>,
    pub result_threshold: usize,
    /// Upper bound on returned results; each of them is an enrichment candidate
    pub max_results: usize,
    pub max_title_chars: usize,
    pub max_snippet_chars: usize,
    pub min_title_chars: usize,
    pub min_snippet_chars: usize,
    /// Fetched page text must be longer than this to replace a snippet
    pub min_enriched_chars: usize,
    /// Pages whose url contains one of these are never fetched
    pub skip_enrichment: Vec<String>,
    /// Base of the synthetic result returned when nothing usable was found;
    /// `None` lets the search come back empty instead
    pub fallback_search_url: Option<String>,
    pub engine_timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
    pub fetch: FetchConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engines: vec![
                EngineConfig::new(SearchEngine::Searxng),
                EngineConfig::new(SearchEngine::DuckDuckGo),
                EngineConfig::new(SearchEngine::Wikipedia),
            ],
            stop_phrases: DEFAULT_STOP_PHRASES.iter().map(|s| s.to_string()).collect(),
            result_threshold: 8,
            max_results: 5,
            max_title_chars: 200,
            max_snippet_chars: 400,
            min_title_chars: 3,
            min_snippet_chars: 15,
            min_enriched_chars: 100,
            skip_enrichment: vec![
                "wikipedia.org".to_string(),
                "baidu.com/s".to_string(),
                "google.com/search".to_string(),
            ],
            fallback_search_url: Some("https://www.baidu.com/s?wd=".to_string()),
            engine_timeout: Duration::from_secs(10),
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
            fetch: FetchConfig::default(),
        }
    }
}
