//! Room-scoped WebSocket chat server.
//!
//! Clients connect over WebSocket, join named rooms, exchange messages that
//! are broadcast to all room members, and see live presence/typing state.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-server
//! cargo run --bin idobata-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{collections::HashMap, sync::Arc};

use clap::Parser;
use tokio::sync::Mutex;

use idobata_server::{
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryMessageStore},
    ui::Server,
    usecase::SessionCoordinator,
};
use idobata_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "idobata-server")]
#[command(about = "Room-scoped WebSocket chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. MessageStore
    // 2. MessagePusher
    // 3. SessionCoordinator
    // 4. Server

    // 1. Create MessageStore (in-memory database)
    let store = Arc::new(InMemoryMessageStore::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let pusher_channels = Arc::new(Mutex::new(HashMap::new()));
    let pusher = Arc::new(WebSocketMessagePusher::new(pusher_channels));

    // 3. Create SessionCoordinator
    let coordinator = Arc::new(SessionCoordinator::new(store.clone(), pusher));

    // 4. Create and run the server
    let server = Server::new(coordinator, store);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
