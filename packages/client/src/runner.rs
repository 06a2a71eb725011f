//! Client execution logic with reconnection support.

use std::{sync::Arc, time::Duration};

use rustyline::{DefaultEditor, error::ReadlineError};
use sajiki_shared::time::SystemClock;
use tokio::sync::mpsc;

use crate::{
    domain::{should_attempt_reconnect, should_exit_immediately},
    drift::DriftConfig,
    error::ClientError,
    session::{SyncSession, run_client_session},
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Settings for one client run
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    pub room_id: String,
    pub user_id: String,
    pub display_name: String,
    /// Interval of drift evaluation between broadcasts
    pub poll_interval: Duration,
    pub drift: DriftConfig,
}

/// Run the client with reconnection logic
///
/// The local player and drift state survive reconnects; rejections by the
/// server (kick, ban, closed room) end the run immediately.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let mut session = SyncSession::new(
        options.room_id.clone(),
        options.user_id.clone(),
        options.display_name.clone(),
        options.drift.clone(),
        Arc::new(SystemClock),
    );
    let mut input_rx = spawn_readline(options.user_id.clone());

    println!(
        "\nYou are '{}' in room '{}'. Type /help for commands. Press Ctrl+C to exit.\n",
        options.user_id, options.room_id
    );

    let mut reconnect_count = 0;
    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            options.url,
            options.user_id,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(
            &options.url,
            &mut session,
            &mut input_rx,
            options.poll_interval,
        )
        .await
        {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                // If connection ended normally (user exit), don't reconnect
                return Ok(());
            }
            Err(e) if should_exit_immediately(&e) => {
                println!("\n{}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                // 参加まで済んでいた接続なら、再接続の回数を数え直す
                if session.is_joined() {
                    reconnect_count = 0;
                }
                reconnect_count += 1;

                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}

/// Read input lines on a blocking thread (rustyline is synchronous)
///
/// The channel closes on Ctrl+C / Ctrl+D.
fn spawn_readline(user_id: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", user_id);
        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
