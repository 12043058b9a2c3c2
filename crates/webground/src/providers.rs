pub mod base;
pub mod canned;
pub mod configs;
pub mod factory;
pub mod openai;
pub mod utils;

#[cfg(test)]
pub mod mock;
