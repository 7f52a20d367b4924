//! Shared Counter Store trait 定義
//!
//! 全インスタンスで共有する接続数カウンタへのインターフェース。
//! 更新は必ずストア側のアトミックな操作（increment / decrement / set）で行い、
//! 呼び出し側で read-modify-write してはならない。

use async_trait::async_trait;

use super::{StoreError, value_object::CounterKey};

/// Shared Counter Store trait
///
/// ## 依存性の逆転（DIP）
///
/// - UseCase 層はこの trait に依存する
/// - Infrastructure 層が InMemory / Redis の実装を提供する
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// キーが存在しなければ 0 で初期化する。初期化した場合は `true`
    async fn ensure_initialized(&self, key: &CounterKey) -> Result<bool, StoreError>;

    /// 現在値を取得（キーが無ければ 0）
    async fn get(&self, key: &CounterKey) -> Result<i64, StoreError>;

    /// 値を上書き
    async fn set(&self, key: &CounterKey, value: i64) -> Result<(), StoreError>;

    /// アトミックに 1 増やし、新しい値を返す
    async fn increment(&self, key: &CounterKey) -> Result<i64, StoreError>;

    /// アトミックに 1 減らし、新しい値を返す
    async fn decrement(&self, key: &CounterKey) -> Result<i64, StoreError>;
}
