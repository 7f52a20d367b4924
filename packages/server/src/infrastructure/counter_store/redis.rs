//! Redis Counter Store 実装
//!
//! 接続数カウンタを Redis の 1 キーに置く。
//! 加減算は `INCR` / `DECR` で行い、サーバー側でアトミックに適用される。

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::{
    domain::{CounterKey, CounterStore, StoreError},
    infrastructure::retry::{RetryPolicy, with_retry},
};

/// Redis Counter Store 実装
///
/// `ConnectionManager` は切断時に自動で再接続する。clone は安価で、
/// 呼び出しごとに clone して使う。
pub struct RedisCounterStore {
    connection: ConnectionManager,
    retry: RetryPolicy,
}

impl RedisCounterStore {
    /// Redis に接続して Counter Store を作成
    ///
    /// 接続できなければ即座にエラーを返す（起動時はリトライしない）。
    pub async fn connect(client: redis::Client, retry: RetryPolicy) -> Result<Self, StoreError> {
        let mut connection = ConnectionManager::new(client).await.map_err(to_store_error)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(to_store_error)?;
        Ok(Self { connection, retry })
    }
}

fn to_store_error(error: redis::RedisError) -> StoreError {
    if error.kind() == redis::ErrorKind::TypeError {
        StoreError::InvalidValue(error.to_string())
    } else {
        StoreError::Unavailable(error.to_string())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn ensure_initialized(&self, key: &CounterKey) -> Result<bool, StoreError> {
        with_retry(&self.retry, "counter.ensure_initialized", || {
            let mut connection = self.connection.clone();
            async move {
                connection
                    .set_nx::<_, _, bool>(key.as_str(), 0)
                    .await
                    .map_err(to_store_error)
            }
        })
        .await
    }

    async fn get(&self, key: &CounterKey) -> Result<i64, StoreError> {
        with_retry(&self.retry, "counter.get", || {
            let mut connection = self.connection.clone();
            async move {
                let value: Option<i64> = connection
                    .get(key.as_str())
                    .await
                    .map_err(to_store_error)?;
                Ok(value.unwrap_or(0))
            }
        })
        .await
    }

    async fn set(&self, key: &CounterKey, value: i64) -> Result<(), StoreError> {
        with_retry(&self.retry, "counter.set", || {
            let mut connection = self.connection.clone();
            async move {
                connection
                    .set::<_, _, ()>(key.as_str(), value)
                    .await
                    .map_err(to_store_error)
            }
        })
        .await
    }

    async fn increment(&self, key: &CounterKey) -> Result<i64, StoreError> {
        let mut connection = self.connection.clone();
        connection
            .incr::<_, _, i64>(key.as_str(), 1)
            .await
            .map_err(to_store_error)
    }

    async fn decrement(&self, key: &CounterKey) -> Result<i64, StoreError> {
        let mut connection = self.connection.clone();
        connection
            .decr::<_, _, i64>(key.as_str(), 1)
            .await
            .map_err(to_store_error)
    }
}
