//! Data Transfer Objects (DTOs) for the watch-together protocol.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs (client intents and server events)
//! - `http`: HTTP API request/response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
