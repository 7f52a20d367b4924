//! UseCase: ローカルのクライアントから受け取ったメッセージを Bus に流す（Local → Bus）
//!
//! 送信元のインスタンスを含む全インスタンスが Bus から同じメッセージを受け取り、
//! それぞれのローカル接続へ配信する。ここではローカル配信を行わない。

use std::sync::Arc;

use crate::domain::{BroadcastBus, ErrorReporter, FailureKind, MessageText, RoomChannels};

use super::error::PublishMessageError;

/// メッセージ publish のユースケース
pub struct PublishMessageUseCase {
    bus: Arc<dyn BroadcastBus>,
    channels: RoomChannels,
    reporter: Arc<dyn ErrorReporter>,
}

impl PublishMessageUseCase {
    pub fn new(
        bus: Arc<dyn BroadcastBus>,
        channels: RoomChannels,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            bus,
            channels,
            reporter,
        }
    }

    /// メッセージ本文を publish する
    ///
    /// 失敗は報告したうえで呼び出し元に返す。メッセージは再送されない。
    pub async fn execute(&self, text: MessageText) -> Result<(), PublishMessageError> {
        self.bus
            .publish(&self.channels.message_topic, text.as_str())
            .await
            .map_err(|e| {
                self.reporter
                    .report(FailureKind::Publish, "message.publish", &e);
                PublishMessageError::from(e)
            })
    }
}
