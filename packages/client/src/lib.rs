//! Sajiki watch-together CLI client.
//!
//! Joins a room over WebSocket, follows the server's playback clock with a
//! simulated player and keeps it in step with a drift corrector.

pub mod command;
pub mod domain;
pub mod drift;
pub mod error;
pub mod formatter;
pub mod player;
pub mod runner;
pub mod session;
mod ui;

pub use runner::{ClientOptions, run_client};
