//! InMemory Broadcast Bus 実装
//!
//! プロセス内の pub/sub。1 つのバスを複数のサーバーインスタンスで共有すれば、
//! Redis なしでインスタンス間のファンアウトを再現できる。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::domain::{BroadcastBus, BusError, BusSubscription, Topic};

/// インメモリ Broadcast Bus 実装
#[derive(Default)]
pub struct InMemoryBroadcastBus {
    subscribers: Mutex<HashMap<Topic, Vec<mpsc::UnboundedSender<String>>>>,
}

impl InMemoryBroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// トピックの全購読を切断する（バスとの接続断を再現する）
    pub async fn disconnect_subscribers(&self, topic: &Topic) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.remove(topic);
    }

    /// トピックの現在の購読者数
    pub async fn subscriber_count(&self, topic: &Topic) -> usize {
        let subscribers = self.subscribers.lock().await;
        subscribers
            .get(topic)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl BroadcastBus for InMemoryBroadcastBus {
    async fn publish(&self, topic: &Topic, payload: &str) -> Result<(), BusError> {
        let mut subscribers = self.subscribers.lock().await;
        if let Some(senders) = subscribers.get_mut(topic) {
            // 受信側が drop された購読はここで掃除する
            senders.retain(|sender| sender.send(payload.to_string()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<BusSubscription, BusError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().await;
        subscribers.entry(topic.clone()).or_default().push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoomChannels, RoomId};

    fn channels() -> RoomChannels {
        RoomChannels::for_room(RoomId::new("chat".to_string()).unwrap())
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_every_message() {
        // テスト項目: 全ての購読者が全てのメッセージを受け取る（ファンアウト）
        // given (前提条件):
        let bus = InMemoryBroadcastBus::new();
        let topic = channels().message_topic;
        let mut first = bus.subscribe(&topic).await.unwrap();
        let mut second = bus.subscribe(&topic).await.unwrap();

        // when (操作):
        bus.publish(&topic, "hello").await.unwrap();
        bus.publish(&topic, "world").await.unwrap();

        // then (期待する結果):
        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await, Some("hello".to_string()));
            assert_eq!(rx.recv().await, Some("world".to_string()));
        }
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        // テスト項目: 別トピックへの publish は届かない
        // given (前提条件):
        let bus = InMemoryBroadcastBus::new();
        let channels = channels();
        let mut count_rx = bus.subscribe(&channels.count_topic).await.unwrap();

        // when (操作):
        bus.publish(&channels.message_topic, "hello").await.unwrap();
        bus.publish(&channels.count_topic, "3").await.unwrap();

        // then (期待する結果):
        assert_eq!(count_rx.recv().await, Some("3".to_string()));
        assert!(count_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        // テスト項目: 受信側を drop した購読は publish 時に取り除かれる
        // given (前提条件):
        let bus = InMemoryBroadcastBus::new();
        let topic = channels().count_topic;
        let kept = bus.subscribe(&topic).await.unwrap();
        let dropped = bus.subscribe(&topic).await.unwrap();
        drop(dropped);

        // when (操作):
        bus.publish(&topic, "1").await.unwrap();

        // then (期待する結果):
        assert_eq!(bus.subscriber_count(&topic).await, 1);
        drop(kept);
    }

    #[tokio::test]
    async fn test_disconnect_subscribers_ends_subscription() {
        // テスト項目: 購読を切断すると受信側は None を受け取る
        // given (前提条件):
        let bus = InMemoryBroadcastBus::new();
        let topic = channels().message_topic;
        let mut rx = bus.subscribe(&topic).await.unwrap();

        // when (操作):
        bus.disconnect_subscribers(&topic).await;

        // then (期待する結果):
        assert_eq!(rx.recv().await, None);
    }
}
