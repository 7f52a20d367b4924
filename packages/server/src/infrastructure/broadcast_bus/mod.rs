//! BroadcastBus の実装
//!
//! - `inmemory`: プロセス内 pub/sub
//! - `redis`: Redis Pub/Sub

pub mod inmemory;
pub mod redis;

pub use inmemory::InMemoryBroadcastBus;
pub use self::redis::RedisBroadcastBus;
