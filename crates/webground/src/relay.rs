pub mod client;
pub mod normalize;
pub mod pacing;
pub mod splitter;
pub mod sse;

pub use client::{consume_response, ClientMessageState};
pub use normalize::normalize_stream;
pub use pacing::paced_events;
pub use splitter::{SplitMode, TokenSplitter};
