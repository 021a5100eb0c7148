//! quizhub server binary.

use tracing_subscriber::EnvFilter;

use quizhub::{Config, QuizServerBuilder, ServerError};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        addr = %config.listen_addr,
        environment = %config.environment,
        "starting quiz server"
    );

    let server = QuizServerBuilder::new()
        .bind(&config.listen_addr)
        .build()
        .await?;
    tracing::info!(
        ws = %format!("ws://{}{}", config.listen_addr, quizhub_transport::WS_PATH),
        health = %format!("http://{}/health", config.listen_addr),
        "endpoints ready"
    );

    server.run().await
}
