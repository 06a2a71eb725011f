//! Watch-together CLI client with drift correction and reconnection support.
//!
//! Joins a room, follows the authoritative playback clock with a simulated
//! player, and sends chat or host commands typed at the prompt.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sajiki-client -- --room-id <id> --user-id alice
//! cargo run --bin sajiki-client -- -r <id> -U bob --display-name Bob
//! ```

use std::time::Duration;

use clap::Parser;
use sajiki_client::{ClientOptions, drift::DriftConfig, run_client};
use sajiki_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "sajiki-client")]
#[command(about = "Watch-together client with a drift-correcting simulated player", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Room to join
    #[arg(short = 'r', long)]
    room_id: String,

    /// User ID (a second connection with the same ID replaces this one)
    #[arg(short = 'U', long)]
    user_id: String,

    /// Display name shown to other participants (defaults to the user ID)
    #[arg(short = 'n', long)]
    display_name: Option<String>,

    /// Interval of drift evaluation between broadcasts in milliseconds
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    if args.poll_interval_ms == 0 {
        tracing::error!("--poll-interval-ms must be greater than 0");
        std::process::exit(1);
    }

    let options = ClientOptions {
        display_name: args.display_name.unwrap_or_else(|| args.user_id.clone()),
        url: args.url,
        room_id: args.room_id,
        user_id: args.user_id,
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        drift: DriftConfig::default(),
    };

    // Run the client
    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
