//! Data Transfer Objects (DTOs) for external communication.
//!
//! - `websocket`: frames exchanged with browser clients
//! - `http`: HTTP endpoint responses

pub mod conversion;
pub mod http;
pub mod websocket;
