use std::fmt;

use futures::StreamExt;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{Html, Node};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::configs::FetchConfig;

/// Elements whose text never reaches the reader
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Result of a single page fetch. Failures are values, not errors: callers keep
/// whatever they had before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedPage {
    Text(String),
    Unavailable { status: Option<u16> },
}

impl FetchedPage {
    pub fn text(&self) -> Option<&str> {
        match self {
            FetchedPage::Text(text) => Some(text),
            FetchedPage::Unavailable { .. } => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchedPage::Unavailable { .. })
    }
}

impl fmt::Display for FetchedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchedPage::Text(text) => f.write_str(text),
            FetchedPage::Unavailable { status: Some(status) } => {
                write!(f, "无法访问网页 ({})", status)
            }
            FetchedPage::Unavailable { status: None } => f.write_str("无法获取网页内容"),
        }
    }
}

/// Downloads a page and reduces it to bounded plain text. One attempt per url.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    config: FetchConfig,
}

impl ContentFetcher {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> FetchedPage {
        let attempt = async {
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, &self.config.user_agent)
                .timeout(self.config.timeout)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                debug!(url, status = status.as_u16(), "page returned non-success status");
                return Ok(FetchedPage::Unavailable {
                    status: Some(status.as_u16()),
                });
            }

            let mut body = Vec::new();
            let mut chunks = response.bytes_stream();
            while let Some(chunk) = chunks.next().await {
                body.extend_from_slice(&chunk?);
                if body.len() >= self.config.max_bytes {
                    debug!(url, max_bytes = self.config.max_bytes, "page cut at download cap");
                    body.truncate(self.config.max_bytes);
                    break;
                }
            }

            let text = html_to_text(&String::from_utf8_lossy(&body));
            Ok::<_, reqwest::Error>(FetchedPage::Text(truncate_chars(
                &text,
                self.config.max_chars,
            )))
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(url, "page fetch cancelled");
                FetchedPage::Unavailable { status: None }
            }
            outcome = attempt => match outcome {
                Ok(page) => page,
                Err(e) => {
                    warn!(url, error = %e, "page fetch failed");
                    FetchedPage::Unavailable { status: None }
                }
            }
        }
    }
}

/// Visible text of an HTML document with whitespace collapsed to single spaces
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => SKIPPED_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
