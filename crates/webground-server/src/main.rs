mod configuration;
mod error;
mod routes;
mod state;

use std::path::Path;

use configuration::Settings;
use tracing::info;
use tracing_subscriber::EnvFilter;
use webground::orchestrator::ChatOrchestrator;
use webground::providers::factory;
use webground::search::SearchAggregator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // An explicit config file may be passed as the only argument
    let settings = match std::env::args_os().nth(1) {
        Some(path) => Settings::from_file(Path::new(&path))?,
        None => Settings::new()?,
    };

    let addr = settings.server.socket_addr()?;
    let models = settings.models.policy()?;
    let provider = factory::get_provider(settings.provider.into_config())?;
    let aggregator = SearchAggregator::new(settings.search.into_config(settings.fetch))?;
    info!(
        default_model = models.default_model(),
        allowed = models.allowed().len(),
        engines = aggregator.config().engines.len(),
        "configuration loaded"
    );

    let state = state::AppState::new(ChatOrchestrator::new(provider, aggregator, models));
    let app = routes::configure(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
