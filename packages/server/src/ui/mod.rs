//! WebSocket / HTTP server implementation.

mod handler;
mod reconciler;
mod server;
mod signal;
pub mod state;

pub use reconciler::spawn_reconciler;
pub use server::Server;
pub use signal::shutdown_signal;
