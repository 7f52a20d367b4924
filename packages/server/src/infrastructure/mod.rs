//! Infrastructure layer: adapters implementing the domain ports.

pub mod broadcast_bus;
pub mod counter_store;
pub mod dto;
pub mod message_pusher;
pub mod reporter;
pub mod repository;
pub mod retry;
