//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{get_messages, get_rooms, get_users, health_check};
pub use websocket::websocket_handler;
