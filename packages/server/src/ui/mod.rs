//! WebSocket chat relay server.

mod handler;
mod server;
mod signal;
pub mod state;
pub mod subscriber;

pub use server::{RelayConfig, Server, ServerError};
pub use signal::shutdown_signal;
