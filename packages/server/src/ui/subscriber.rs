//! Bus → Local の購読ループ
//!
//! 起動時に count / message の 2 トピックを購読し、トピックごとのタスクで
//! ペイロードを DTO に変換してローカルのクライアントへ配信する。
//! 購読が切れた場合はリトライポリシーに従って再購読し、それでも失敗したら
//! 報告してそのフィードなしで動き続ける。

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    domain::{
        BroadcastBus, BusError, BusSubscription, ErrorReporter, FailureKind, RoomChannels, Topic,
    },
    infrastructure::{
        dto::websocket::{CountUpdateMessage, NewMessageMessage},
        retry::{RetryPolicy, with_retry},
    },
    usecase::RelayUseCase,
};

/// 購読するフィードの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Count,
    Message,
}

impl Feed {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Message => "message",
        }
    }
}

/// Bus の購読を監督し、受け取ったペイロードをローカルへ流す
pub struct BusRelay {
    bus: Arc<dyn BroadcastBus>,
    relay: Arc<RelayUseCase>,
    channels: RoomChannels,
    retry: RetryPolicy,
    reporter: Arc<dyn ErrorReporter>,
}

impl BusRelay {
    pub fn new(
        bus: Arc<dyn BroadcastBus>,
        relay: Arc<RelayUseCase>,
        channels: RoomChannels,
        retry: RetryPolicy,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            bus,
            relay,
            channels,
            retry,
            reporter,
        }
    }

    /// 両方のトピックを購読し、配信タスクを起動する
    ///
    /// 最初の購読はここで待つので、戻った時点で Bus からの配信を受け取れる。
    pub async fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::with_capacity(2);
        for feed in [Feed::Count, Feed::Message] {
            let subscription = self.subscribe(feed).await;
            let relay = self.clone();
            tasks.push(tokio::spawn(async move {
                relay.supervise(feed, subscription).await;
            }));
        }
        tasks
    }

    fn topic(&self, feed: Feed) -> &Topic {
        match feed {
            Feed::Count => &self.channels.count_topic,
            Feed::Message => &self.channels.message_topic,
        }
    }

    async fn subscribe(&self, feed: Feed) -> Option<BusSubscription> {
        let topic = self.topic(feed);
        match with_retry(&self.retry, "bus.subscribe", || self.bus.subscribe(topic)).await {
            Ok(subscription) => {
                tracing::info!(topic = %topic, feed = feed.as_str(), "Subscribed to bus topic");
                Some(subscription)
            }
            Err(e) => {
                self.reporter
                    .report(FailureKind::Subscription, "bus.subscribe", &e);
                None
            }
        }
    }

    async fn supervise(&self, feed: Feed, mut subscription: Option<BusSubscription>) {
        while let Some(mut feed_rx) = subscription.take() {
            while let Some(payload) = feed_rx.recv().await {
                self.deliver(feed, payload).await;
            }

            let topic = self.topic(feed);
            let lost = BusError::SubscribeFailed {
                topic: topic.to_string(),
                reason: "subscription closed".to_string(),
            };
            self.reporter
                .report(FailureKind::Subscription, "bus.feed", &lost);
            tokio::time::sleep(self.retry.base_delay).await;
            subscription = self.subscribe(feed).await;
        }
        tracing::error!(
            topic = %self.topic(feed),
            feed = feed.as_str(),
            "Bus feed lost, running without it"
        );
    }

    async fn deliver(&self, feed: Feed, payload: String) {
        let json = match feed {
            Feed::Count => {
                let Ok(count) = self.relay.accept_count_update(&payload) else {
                    return;
                };
                serde_json::to_string(&CountUpdateMessage::from(count))
            }
            Feed::Message => {
                let message = self.relay.accept_new_message(payload);
                serde_json::to_string(&NewMessageMessage::from(message))
            }
        };

        match json {
            Ok(json) => {
                // 失敗は RelayUseCase 側で報告済み
                let _ = self.relay.broadcast_to_local(&json).await;
            }
            Err(e) => self
                .reporter
                .report(FailureKind::Delivery, "relay.serialize", &e),
        }
    }
}
