//! Shared utilities for the Idobata chat application.
//!
//! This crate provides the pieces both the server and the client need:
//! logging setup and time handling.

pub mod logger;
pub mod time;
