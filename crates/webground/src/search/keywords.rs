/// Leading interrogative and filler phrases removed before querying search engines
pub const DEFAULT_STOP_PHRASES: &[&str] = &[
    "什么是",
    "什么叫",
    "请问",
    "你知道",
    "告诉我",
    "介绍一下",
    "解释一下",
];

const PUNCTUATION: &[char] = &['？', '?', '！', '!', '。', '.', '，', ','];

/// Turns a conversational question into a search-engine friendly term string.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stop_phrases: Vec<String>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_PHRASES.iter().copied())
    }
}

impl KeywordExtractor {
    pub fn new<I, S>(stop_phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stop_phrases = stop_phrases
            .into_iter()
            .map(Into::into)
            .filter(|phrase: &String| !phrase.is_empty())
            .collect();
        Self { stop_phrases }
    }

    /// Strip leading stop phrases and punctuation. Never returns an empty string:
    /// when nothing is left the original query is returned unchanged.
    pub fn extract(&self, query: &str) -> String {
        let mut rest = query.trim();
        while let Some(stripped) = self
            .stop_phrases
            .iter()
            .find_map(|phrase| rest.strip_prefix(phrase.as_str()))
        {
            rest = stripped.trim_start();
        }

        let cleaned: String = rest.chars().filter(|c| !PUNCTUATION.contains(c)).collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.is_empty() {
            query.to_string()
        } else {
            collapsed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_phrase_and_punctuation() {
        let extractor = KeywordExtractor::default();
        assert_eq!(extractor.extract("什么是量子计算？"), "量子计算");
        assert_eq!(extractor.extract("介绍一下 Rust 的所有权, 谢谢!"), "Rust 的所有权 谢谢");
    }

    #[test]
    fn test_strips_chained_leading_phrases() {
        let extractor = KeywordExtractor::default();
        assert_eq!(extractor.extract("请问什么是区块链"), "区块链");
    }

    #[test]
    fn test_only_leading_phrases_are_removed() {
        let extractor = KeywordExtractor::default();
        assert_eq!(extractor.extract("今天北京天气"), "今天北京天气");
        assert_eq!(extractor.extract("猫是什么是动物"), "猫是什么是动物");
    }

    #[test]
    fn test_filler_only_queries_fall_back_to_input() {
        let extractor = KeywordExtractor::default();
        for query in ["请问", "什么是？", "告诉我。。", "  请问  ", "?!"] {
            assert_eq!(extractor.extract(query), query);
        }
    }

    #[test]
    fn test_custom_phrases() {
        let extractor = KeywordExtractor::new(["what is", "tell me about"]);
        assert_eq!(extractor.extract("what is a monad?"), "a monad");
        assert_eq!(extractor.extract("tell me about"), "tell me about");
    }
}
