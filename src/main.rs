//! CLI for QuoteHub
//!
//! Subcommands:
//! - `server`: run the WebSocket hub
//! - `client`: connect, subscribe to symbols and print what arrives (useful for smoke tests)

use std::time::Duration;

use clap::{Parser, Subcommand};
use quotehub::config::load_config;
use quotehub::hub::Hub;
use quotehub::hub::heartbeat::run_heartbeat;
use quotehub::transport::start_websocket_server;
use quotehub::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "quotehub")]
struct Cli {
    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the WebSocket hub
    Server,
    /// Run the example client (connects, subscribes, prints incoming frames)
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
        /// Symbols to subscribe to
        #[arg(long, value_delimiter = ',', default_value = "005930")]
        symbols: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command {
        Command::Server => {
            if let Err(e) = run_server().await {
                error!("Server failed: {}", e);
            }
        }
        Command::Client { url, symbols } => {
            if let Err(e) = run_client(&url, symbols).await {
                error!("Client failed: {}", e);
            }
        }
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let addr = config.server.addr();
    let hub = Hub::new();

    if config.hub.heartbeat_interval_secs > 0 {
        let period = Duration::from_secs(config.hub.heartbeat_interval_secs);
        tokio::spawn(run_heartbeat(hub.clone(), period));
    }

    tokio::select! {
        result = start_websocket_server(addr, hub.clone(), config.clone()) => {
            result?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!(
                connections = hub.connection_count(),
                "Shutdown signal received. Exiting gracefully."
            );
        }
    }

    Ok(())
}

async fn run_client(url: &str, symbols: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;

    let subscribe = json!({ "action": "subscribe", "symbols": symbols });
    ws_stream
        .send(WsMessage::Text(subscribe.to_string().into()))
        .await?;

    while let Some(frame) = ws_stream.next().await {
        match frame? {
            WsMessage::Text(text) => println!("{}", text.as_str()),
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}
