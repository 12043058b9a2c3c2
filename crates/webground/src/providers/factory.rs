use std::sync::Arc;

use anyhow::Result;

use super::{
    base::CompletionProvider, canned::CannedProvider, configs::ProviderConfig,
    openai::OpenAiProvider,
};

pub fn get_provider(config: ProviderConfig) -> Result<Arc<dyn CompletionProvider>> {
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Arc::new(OpenAiProvider::new(openai_config)?)),
        ProviderConfig::Canned(canned_config) => Ok(Arc::new(CannedProvider::new(canned_config))),
    }
}
