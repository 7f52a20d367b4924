//! ConnectionRepository の実装
//!
//! - `inmemory`: プロセス内のローカル接続レジストリ

pub mod inmemory;

pub use inmemory::InMemoryConnectionRepository;
