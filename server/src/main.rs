use clap::Parser;
use log::{error, info, warn};
use server::config::{Args, OriginPolicy};
use server::network::Server;

/// Parses the command line, binds the listener and runs the match loop
/// until it fails or Ctrl+C arrives.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    if config.origins == OriginPolicy::Any {
        warn!("No allowed origins configured, accepting connections from any origin");
    }

    let mut server = Server::new(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
