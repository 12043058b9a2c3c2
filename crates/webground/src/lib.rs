pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod prompt_template;
pub mod providers;
pub mod relay;
pub mod search;
