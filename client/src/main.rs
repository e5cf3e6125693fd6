use clap::Parser;
use client::network::{Client, ClientOptions};
use log::info;
use shared::{Orientation, SideRequest};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Player name shown to the opponent
    #[arg(short = 'n', long, default_value = "bot")]
    name: String,

    /// Side to play: left, right or auto
    #[arg(long, default_value = "auto", value_parser = parse_side)]
    side: SideRequest,

    /// Paddle orientation, only used when this client is the first to join
    #[arg(short = 'o', long, value_parser = parse_orientation)]
    orientation: Option<Orientation>,

    /// Request a rematch whenever a match ends
    #[arg(long)]
    restart: bool,

    /// Milliseconds between paddle updates
    #[arg(long, default_value = "16")]
    update_ms: u64,
}

fn parse_side(value: &str) -> Result<SideRequest, String> {
    match value {
        "left" => Ok(SideRequest::Left),
        "right" => Ok(SideRequest::Right),
        "auto" => Ok(SideRequest::Auto),
        other => Err(format!("expected left, right or auto, got {}", other)),
    }
}

fn parse_orientation(value: &str) -> Result<Orientation, String> {
    match value {
        "horizontal" => Ok(Orientation::Horizontal),
        "vertical" => Ok(Orientation::Vertical),
        other => Err(format!("expected horizontal or vertical, got {}", other)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Joining {} as {} ({:?})", args.server, args.name, args.side);

    let options = ClientOptions {
        side: args.side,
        orientation: args.orientation,
        restart: args.restart,
        update_interval: Duration::from_millis(args.update_ms.max(1)),
        ..ClientOptions::new(args.server, args.name)
    };

    let mut client = Client::connect(options).await?;
    client.run().await?;

    Ok(())
}
