use clap::Parser;
use gridrush::{HexDigestAuth, ServerConfig, ServerError};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = ServerConfig::parse();
    init_tracing();
    config.validate()?;

    let bind_addr = config.bind_addr;
    let state = gridrush::build_state(config, HexDigestAuth);
    let app = gridrush::router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "gridrush server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
