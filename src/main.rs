use blog_api::{run_app, Config};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "blog_api=info,tower_http=info";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("invalid configuration: {:#}", error);
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    if let Err(error) = run_app(config).await {
        tracing::error!("server error: {:#}", error);
        std::process::exit(1);
    }
}
