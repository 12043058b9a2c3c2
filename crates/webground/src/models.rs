pub mod message;
pub mod search;
pub mod stream;
