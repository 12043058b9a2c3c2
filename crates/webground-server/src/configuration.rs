use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use webground::orchestrator::{ModelPolicy, DEFAULT_ALLOWED_MODELS, DEFAULT_MODEL};
use webground::providers::configs::{
    CannedProviderConfig, OpenAiProviderConfig, ProviderConfig,
};
use webground::search::{EngineConfig, FetchConfig, SearchConfig, SearchEngine};

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_provider_timeout")]
        timeout_secs: u64,
    },
    Canned {
        #[serde(default = "default_canned_reply")]
        reply: String,
        #[serde(default = "default_chunk_delay")]
        chunk_delay_ms: u64,
    },
}

impl ProviderSettings {
    pub fn into_config(self) -> ProviderConfig {
        match self {
            ProviderSettings::OpenAi {
                host,
                api_key,
                timeout_secs,
            } => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key: api_key.filter(|key| !key.is_empty()),
                timeout: Duration::from_secs(timeout_secs),
            }),
            ProviderSettings::Canned {
                reply,
                chunk_delay_ms,
            } => ProviderConfig::Canned(CannedProviderConfig {
                reply,
                chunk_delay: Duration::from_millis(chunk_delay_ms),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_allowed_models")]
    pub allowed: Vec<String>,
    #[serde(default = "default_model")]
    pub default: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            allowed: default_allowed_models(),
            default: default_model(),
        }
    }
}

impl ModelSettings {
    pub fn policy(&self) -> Result<ModelPolicy, ConfigError> {
        ModelPolicy::new(self.allowed.clone(), self.default.as_str())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Per-engine endpoint overrides, e.g. a self-hosted SearXNG instance
#[derive(Debug, Default, Deserialize)]
pub struct EndpointSettings {
    pub searxng: Option<String>,
    pub duckduckgo: Option<String>,
    pub wikipedia: Option<String>,
}

impl EndpointSettings {
    fn engine_config(&self, engine: SearchEngine) -> EngineConfig {
        let endpoint = match engine {
            SearchEngine::Searxng => &self.searxng,
            SearchEngine::DuckDuckGo => &self.duckduckgo,
            SearchEngine::Wikipedia => &self.wikipedia,
        };
        match endpoint {
            Some(endpoint) => EngineConfig::with_endpoint(engine, endpoint.as_str()),
            None => EngineConfig::new(engine),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub engines: Vec<SearchEngine>,
    pub endpoints: EndpointSettings,
    pub stop_phrases: Vec<String>,
    pub result_threshold: usize,
    pub max_results: usize,
    pub max_title_chars: usize,
    pub max_snippet_chars: usize,
    pub min_title_chars: usize,
    pub min_snippet_chars: usize,
    pub skip_enrichment: Vec<String>,
    /// An empty value disables the synthetic fallback result
    pub fallback_search_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let defaults = SearchConfig::default();
        Self {
            engines: defaults.engines.iter().map(|e| e.engine).collect(),
            endpoints: EndpointSettings::default(),
            stop_phrases: defaults.stop_phrases,
            result_threshold: defaults.result_threshold,
            max_results: defaults.max_results,
            max_title_chars: defaults.max_title_chars,
            max_snippet_chars: defaults.max_snippet_chars,
            min_title_chars: defaults.min_title_chars,
            min_snippet_chars: defaults.min_snippet_chars,
            skip_enrichment: defaults.skip_enrichment,
            fallback_search_url: defaults.fallback_search_url.unwrap_or_default(),
            timeout_secs: defaults.engine_timeout.as_secs(),
            user_agent: defaults.user_agent,
            accept_language: defaults.accept_language,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub max_chars: usize,
    pub max_bytes: usize,
    /// Page text no longer than this keeps the search snippet instead
    pub min_useful_chars: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        let defaults = FetchConfig::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            max_chars: defaults.max_chars,
            max_bytes: defaults.max_bytes,
            min_useful_chars: SearchConfig::default().min_enriched_chars,
        }
    }
}

impl SearchSettings {
    pub fn into_config(self, fetch: FetchSettings) -> SearchConfig {
        let engines = self
            .engines
            .iter()
            .map(|engine| self.endpoints.engine_config(*engine))
            .collect();

        SearchConfig {
            engines,
            stop_phrases: self.stop_phrases,
            result_threshold: self.result_threshold,
            max_results: self.max_results,
            max_title_chars: self.max_title_chars,
            max_snippet_chars: self.max_snippet_chars,
            min_title_chars: self.min_title_chars,
            min_snippet_chars: self.min_snippet_chars,
            min_enriched_chars: fetch.min_useful_chars,
            skip_enrichment: self.skip_enrichment,
            fallback_search_url: Some(self.fallback_search_url).filter(|url| !url.is_empty()),
            engine_timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            accept_language: self.accept_language,
            fetch: FetchConfig {
                timeout: Duration::from_secs(fetch.timeout_secs),
                max_chars: fetch.max_chars,
                max_bytes: fetch.max_bytes,
                user_agent: self.user_agent,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
}

impl Settings {
    /// Defaults, then `webground.toml` in the working directory if present,
    /// then `WEBGROUND_*` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate(File::with_name("webground").required(false))
    }

    /// Like [`Settings::new`] but reading an explicit, mandatory config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::load_and_validate(File::from(path).required(true))
    }

    fn load_and_validate<F>(file: F) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .add_source(file)
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("WEBGROUND")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("models.allowed")
                    .with_list_parse_key("search.engines")
                    .with_list_parse_key("search.stop_phrases")
                    .with_list_parse_key("search.skip_enrichment"),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => {
                // A default outside the allow-list would reject every request
                settings.models.policy()?;
                Ok(settings)
            }
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    // "missing field `type`"
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else if let config::ConfigError::NotFound(field) = &err {
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_openai_host() -> String {
    "https://api.openai.com".to_string()
}

fn default_provider_timeout() -> u64 {
    600
}

fn default_canned_reply() -> String {
    "This is a canned reply from webground.".to_string()
}

fn default_chunk_delay() -> u64 {
    50
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_allowed_models() -> Vec<String> {
    DEFAULT_ALLOWED_MODELS.iter().map(|m| m.to_string()).collect()
}
