use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A normalized search hit. `url` is the de-duplication key.
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl SearchResult {
    pub fn new<T: Into<String>, U: Into<String>, C: Into<String>>(
        title: T,
        url: U,
        content: C,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
        }
    }

    pub fn source(&self) -> Source {
        Source {
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }
}

/// Outcome of optionally augmenting the user's input with search context.
///
/// An empty `content` means no usable augmentation could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessedContent {
    pub content: String,
    pub search_results: Vec<SearchResult>,
}

impl ProcessedContent {
    pub fn passthrough<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            search_results: Vec::new(),
        }
    }
}

/// Citation surfaced to the client next to the streamed answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: String,
}

/// Response header carrying the citation list next to the event stream
pub const CITATION_HEADER: &str = "results";

/// Encode citations for the `results` response header. Titles are percent-encoded
/// so the header value stays ASCII.
pub fn encode_citation_header(results: &[SearchResult]) -> String {
    let encoded: Vec<Source> = results
        .iter()
        .map(|result| Source {
            url: result.url.clone(),
            title: urlencoding::encode(&result.title).into_owned(),
        })
        .collect();
    serde_json::to_string(&encoded).unwrap_or_else(|_| "[]".to_string())
}

/// Inverse of [`encode_citation_header`]. Titles that fail to decode are kept verbatim.
pub fn decode_citation_header(value: &str) -> Result<Vec<Source>, serde_json::Error> {
    let sources: Vec<Source> = serde_json::from_str(value)?;
    Ok(sources
        .into_iter()
        .map(|source| {
            let title = urlencoding::decode(&source.title)
                .map(|t| t.into_owned())
                .unwrap_or(source.title);
            Source {
                url: source.url,
                title,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_header_is_ascii_and_decodes() {
        let results = vec![
            SearchResult::new("量子计算 - 维基百科", "https://zh.wikipedia.org/wiki/x", "..."),
            SearchResult::new("Plain title", "https://example.com/a", "..."),
        ];

        let header = encode_citation_header(&results);
        assert!(header.is_ascii());
        assert!(!header.contains("content"));

        let sources = decode_citation_header(&header).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "量子计算 - 维基百科");
        assert_eq!(sources[0].url, "https://zh.wikipedia.org/wiki/x");
        assert_eq!(sources[1].title, "Plain title");
    }

    #[test]
    fn test_empty_citation_header() {
        assert_eq!(encode_citation_header(&[]), "[]");
        assert!(decode_citation_header("[]").unwrap().is_empty());
    }
}
