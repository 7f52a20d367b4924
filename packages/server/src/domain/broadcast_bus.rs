//! Broadcast Bus trait 定義
//!
//! インスタンス間のファンアウトに使う publish/subscribe のインターフェース。
//! 購読者は publish された全てのメッセージを受け取る（ワークスティーリングではない）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{BusError, value_object::Topic};

/// 購読したトピックのペイロードを受け取るチャンネル
///
/// 送信側が閉じられた（`recv()` が `None` を返した）場合、その購読は失われている。
pub type BusSubscription = mpsc::UnboundedReceiver<String>;

/// Broadcast Bus trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BroadcastBus: Send + Sync {
    /// トピックにペイロードを publish する
    async fn publish(&self, topic: &Topic, payload: &str) -> Result<(), BusError>;

    /// トピックを購読する
    async fn subscribe(&self, topic: &Topic) -> Result<BusSubscription, BusError>;
}
