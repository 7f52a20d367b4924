//! InMemory Counter Store 実装
//!
//! 単一プロセス内で動くカウンタ。`--backend memory` での単独起動と、
//! 同一プロセス内で複数インスタンスを動かすテストで共有ストアとして使う。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{CounterKey, CounterStore, StoreError};

/// インメモリ Counter Store 実装
///
/// Mutex の内側で更新するため、increment / decrement はアトミックになる。
#[derive(Default)]
pub struct InMemoryCounterStore {
    values: Mutex<HashMap<CounterKey, i64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn ensure_initialized(&self, key: &CounterKey) -> Result<bool, StoreError> {
        let mut values = self.values.lock().await;
        if values.contains_key(key) {
            return Ok(false);
        }
        values.insert(key.clone(), 0);
        Ok(true)
    }

    async fn get(&self, key: &CounterKey) -> Result<i64, StoreError> {
        let values = self.values.lock().await;
        Ok(values.get(key).copied().unwrap_or(0))
    }

    async fn set(&self, key: &CounterKey, value: i64) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        values.insert(key.clone(), value);
        Ok(())
    }

    async fn increment(&self, key: &CounterKey) -> Result<i64, StoreError> {
        let mut values = self.values.lock().await;
        let value = values.entry(key.clone()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn decrement(&self, key: &CounterKey) -> Result<i64, StoreError> {
        let mut values = self.values.lock().await;
        let value = values.entry(key.clone()).or_insert(0);
        *value -= 1;
        Ok(*value)
    }
}
