use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::search::SearchResult;

/// Supported search backends. Each variant owns its query schema and its
/// response adapter; nothing else in the crate knows the backend shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    Searxng,
    #[serde(alias = "ddg")]
    DuckDuckGo,
    Wikipedia,
}

impl SearchEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Searxng => "searxng",
            Self::DuckDuckGo => "duckduckgo",
            Self::Wikipedia => "wikipedia",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Searxng => "https://searx.be/search",
            Self::DuckDuckGo => "https://api.duckduckgo.com/",
            Self::Wikipedia => "https://zh.wikipedia.org/w/api.php",
        }
    }

    pub fn query_params(&self, terms: &str) -> Vec<(&'static str, String)> {
        let params: Vec<(&'static str, &str)> = match self {
            Self::Searxng => vec![
                ("q", terms),
                ("format", "json"),
                ("categories", "general"),
                ("engines", "bing,google,duckduckgo"),
                ("language", "zh-CN"),
            ],
            Self::DuckDuckGo => vec![
                ("q", terms),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
            Self::Wikipedia => vec![
                ("action", "opensearch"),
                ("search", terms),
                ("limit", "3"),
                ("namespace", "0"),
                ("format", "json"),
                ("origin", "*"),
            ],
        };
        params
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect()
    }

    /// Map the backend's JSON into raw results. Unexpected shapes yield nothing;
    /// length and url checks happen later in the aggregator.
    pub fn parse(&self, data: &Value, terms: &str) -> Vec<SearchResult> {
        match self {
            Self::Searxng => parse_searxng(data),
            Self::DuckDuckGo => parse_duckduckgo(data, terms),
            Self::Wikipedia => parse_wikipedia(data),
        }
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn parse_searxng(data: &Value) -> Vec<SearchResult> {
    let Some(results) = data.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .map(|result| {
            let content = match str_field(result, "content") {
                "" => str_field(result, "snippet"),
                content => content,
            };
            SearchResult::new(str_field(result, "title"), str_field(result, "url"), content)
        })
        .collect()
}

fn parse_duckduckgo(data: &Value, terms: &str) -> Vec<SearchResult> {
    let mut results = Vec::new();

    let abstract_text = str_field(data, "Abstract");
    if abstract_text.chars().count() > 20 {
        let title = match str_field(data, "Heading") {
            "" => terms,
            heading => heading,
        };
        let url = match str_field(data, "AbstractURL") {
            "" => format!("https://duckduckgo.com/?q={}", urlencoding::encode(terms)),
            url => url.to_string(),
        };
        results.push(SearchResult::new(title, url, abstract_text));
    }

    if let Some(topics) = data.get("RelatedTopics").and_then(Value::as_array) {
        for topic in topics.iter().take(3) {
            let url = str_field(topic, "FirstURL");
            let text = str_field(topic, "Text");
            if url.is_empty() || text.is_empty() {
                continue;
            }
            let title = match text.split(" - ").next() {
                Some(head) if !head.is_empty() => head.to_string(),
                _ => text.chars().take(100).collect(),
            };
            results.push(SearchResult::new(title, url, text));
        }
    }

    results
}

fn parse_wikipedia(data: &Value) -> Vec<SearchResult> {
    let Some(parts) = data.as_array().filter(|parts| parts.len() >= 4) else {
        return Vec::new();
    };
    let empty = Vec::new();
    let titles = parts[1].as_array().unwrap_or(&empty);
    let descriptions = parts[2].as_array().unwrap_or(&empty);
    let urls = parts[3].as_array().unwrap_or(&empty);

    titles
        .iter()
        .zip(urls)
        .take(3)
        .enumerate()
        .filter_map(|(i, (title, url))| {
            let title = title.as_str().filter(|t| !t.is_empty())?;
            let url = url.as_str().filter(|u| !u.is_empty())?;
            let description = descriptions
                .get(i)
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("关于{}的维基百科条目", title));
            Some(SearchResult::new(title, url, description))
        })
        .collect()
}

/// An engine together with the endpoint it is reached at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub engine: SearchEngine,
    pub endpoint: String,
}

impl EngineConfig {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            endpoint: engine.default_endpoint().to_string(),
        }
    }

    pub fn with_endpoint<S: Into<String>>(engine: SearchEngine, endpoint: S) -> Self {
        Self {
            engine,
            endpoint: endpoint.into(),
        }
    }
}
