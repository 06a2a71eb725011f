//! Utilities shared by the Sajiki server and client.

pub mod logger;
pub mod time;
