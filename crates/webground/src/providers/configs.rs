use std::time::Duration;

/// Unified enum to wrap different provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
    Canned(CannedProviderConfig),
}

/// Any endpoint speaking the OpenAI chat-completions streaming protocol
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Answers every request with the same text, paced like a live model
#[derive(Debug, Clone)]
pub struct CannedProviderConfig {
    pub reply: String,
    pub chunk_delay: Duration,
}
