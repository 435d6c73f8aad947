//! CLI chat client for the Idobata server.
//!
//! Connects to the chat server, identifies with a display name, and maps
//! REPL input to chat events. Automatically reconnects on disconnection
//! (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-client -- --username Alice
//! cargo run --bin idobata-client -- -n Bob
//! ```

use clap::Parser;

use idobata_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "idobata-client")]
#[command(about = "CLI chat client for room-scoped WebSocket chat", long_about = None)]
struct Args {
    /// Display name to join the chat with
    #[arg(short = 'n', long)]
    username: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = idobata_client::run_client(args.url, args.username).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
