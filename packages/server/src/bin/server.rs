//! Watch-together sync server.
//!
//! Keeps one authoritative playback clock per room and fans it out to every
//! participant over WebSocket, together with chat and WebRTC signaling.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sajiki-server
//! cargo run --bin sajiki-server -- --host 0.0.0.0 --port 3000 --reconcile-interval-ms 2000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use sajiki_server::{config::ServerConfig, ui::Server, ui::state::AppState};
use sajiki_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "sajiki-server")]
#[command(about = "Watch-together sync server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Interval of the playback reconciliation loop in milliseconds
    #[arg(long, default_value = "3000")]
    reconcile_interval_ms: u64,

    /// Default room capacity when a room is created without one
    #[arg(long, default_value = "10")]
    max_participants: usize,

    /// Number of chat messages kept per room
    #[arg(long, default_value = "100")]
    chat_history: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    if args.reconcile_interval_ms == 0 {
        tracing::error!("--reconcile-interval-ms must be greater than 0");
        std::process::exit(1);
    }

    // Initialize dependencies in order:
    // 1. Config
    // 2. AppState (store, presence, pusher and use cases)
    // 3. Server

    // 1. Build config from the command line
    let config = ServerConfig {
        reconcile_interval: Duration::from_millis(args.reconcile_interval_ms),
        max_participants: args.max_participants,
        chat_history_capacity: args.chat_history,
    };
    tracing::debug!("{:?}", config);

    // 2. Wire the in-memory implementations against the system clock
    let state = AppState::in_memory(&config, Arc::new(SystemClock));

    // 3. Create and run the server
    let server = Server::new(state, config.reconcile_interval);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
