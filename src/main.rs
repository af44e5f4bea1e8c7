use anyhow::Result;
use factcheck_graphflow::server::{router, AppState};
use factcheck_graphflow::{Config, FactChecker};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("factcheck_graphflow=debug,graph_flow=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let checker = FactChecker::from_config(&config)?;
    let app = router(AppState::new(checker));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(model = %config.model, "Fact-check server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
