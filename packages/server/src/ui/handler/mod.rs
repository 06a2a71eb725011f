//! Request handlers.

mod http;
mod websocket;

pub use http::{
    create_room, debug_room_state, get_room_by_join_code, get_room_detail, get_rooms,
    health_check,
};
pub use websocket::websocket_handler;
