//! Redis Broadcast Bus 実装
//!
//! publish は共有の `ConnectionManager` で `PUBLISH` する。送るのは 1 回だけで、
//! 失敗しても再送しない。
//! 購読は Redis の仕様上 subscribe 専用の接続が必要なため、
//! 購読ごとに `aio::PubSub` 接続を張り、転送タスクで mpsc に流し込む。

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::{AsyncCommands, aio::ConnectionManager};
use tokio::sync::mpsc;

use crate::domain::{BroadcastBus, BusError, BusSubscription, Topic};

/// Redis Broadcast Bus 実装
pub struct RedisBroadcastBus {
    client: redis::Client,
    connection: ConnectionManager,
}

impl RedisBroadcastBus {
    /// Redis に接続して Broadcast Bus を作成
    ///
    /// `PING` が通らなければ `BusError::Unavailable` を返す。
    pub async fn connect(client: redis::Client) -> Result<Self, BusError> {
        let unavailable = |e: redis::RedisError| BusError::Unavailable(e.to_string());

        let mut connection = ConnectionManager::new(client.clone())
            .await
            .map_err(unavailable)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(unavailable)?;
        Ok(Self { client, connection })
    }
}

#[async_trait]
impl BroadcastBus for RedisBroadcastBus {
    async fn publish(&self, topic: &Topic, payload: &str) -> Result<(), BusError> {
        let mut connection = self.connection.clone();
        let receivers: i64 = connection
            .publish(topic.as_str(), payload)
            .await
            .map_err(|e| BusError::PublishFailed {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
        tracing::trace!(topic = %topic, receivers, "Published to Redis");
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<BusSubscription, BusError> {
        let subscribe_failed = |e: redis::RedisError| BusError::SubscribeFailed {
            topic: topic.to_string(),
            reason: e.to_string(),
        };

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(subscribe_failed)?;
        pubsub
            .subscribe(topic.as_str())
            .await
            .map_err(subscribe_failed)?;
        tracing::info!(topic = %topic, "Subscribed to Redis channel");

        let (tx, rx) = mpsc::unbounded_channel();
        let topic = topic.clone();
        tokio::spawn(async move {
            let mut messages = std::pin::pin!(pubsub.into_on_message());
            loop {
                tokio::select! {
                    message = messages.next() => {
                        let Some(message) = message else {
                            tracing::warn!(topic = %topic, "Redis subscription stream ended");
                            break;
                        };
                        match message.get_payload::<String>() {
                            Ok(payload) => {
                                if tx.send(payload).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(topic = %topic, error = %e, "Dropping non-UTF-8 payload");
                            }
                        }
                    }
                    // 購読側が drop されたら Redis 接続も閉じる
                    _ = tx.closed() => break,
                }
            }
        });

        Ok(rx)
    }
}
