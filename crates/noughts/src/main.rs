//! `noughts-server`: runs the match server with in-memory stores.

use clap::Parser;
use noughts::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), NoughtsError> {
    let cli = Cli::parse();

    let filter = match cli.log.as_deref() {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from(&cli);

    let server = NoughtsServer::builder()
        .config(config)
        .build_in_memory(UsernameAuth)
        .await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
