pub mod aggregator;
pub mod configs;
pub mod engines;
pub mod fetch;
pub mod keywords;

pub use aggregator::SearchAggregator;
pub use configs::{FetchConfig, SearchConfig};
pub use engines::{EngineConfig, SearchEngine};
pub use fetch::{ContentFetcher, FetchedPage};
pub use keywords::KeywordExtractor;
