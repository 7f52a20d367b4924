//! CounterStore の実装
//!
//! - `inmemory`: 単一プロセス用
//! - `redis`: 複数インスタンスで共有する本番用

pub mod inmemory;
pub mod redis;

pub use inmemory::InMemoryCounterStore;
pub use self::redis::RedisCounterStore;
