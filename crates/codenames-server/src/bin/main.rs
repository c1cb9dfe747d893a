use std::error::Error;

use tracing::info;
use tracing_subscriber::EnvFilter;

use codenames_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("codenames_server=info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = format!("0.0.0.0:{}", config.port);
    let (app, _state) = codenames_server::build_app(config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
