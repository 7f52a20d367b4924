//! Multi-instance WebSocket chat relay.
//!
//! Every instance keeps its own registry of locally connected clients and
//! cooperates with the other instances through a shared counter store and a
//! publish/subscribe bus, so that all clients see one logical room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
