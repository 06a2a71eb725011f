//! Sajiki watch-together server library.
//!
//! A server-authoritative playback clock for small rooms, with chat, presence
//! and a WebRTC signaling relay, served over axum WebSockets.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
