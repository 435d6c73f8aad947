//! Room-scoped WebSocket chat coordination library.
//!
//! This library provides the session/room coordination core for Idobata:
//! presence, room membership, typing state, ordered broadcast fan-out,
//! bounded per-room history, and the WebSocket/HTTP surface around it.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
