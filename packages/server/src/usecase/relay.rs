//! UseCase: Bus から受け取ったペイロードをローカルのクライアントへ配信する（Bus → Local）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - count トピックのペイロードの解釈（10 進整数、0 で下限を切る）
//! - message トピックのペイロードから ChatMessage を組み立てる
//! - ローカル接続への一斉配信
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続数・メッセージの配信
//! - 異常系：壊れたペイロード、既に閉じたクライアント

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatMessage, ConnectionCount, ConnectionRepository, ErrorReporter, FailureKind, InstanceId,
    MessagePusher, MessageText,
};

use super::error::RelayError;

/// Bus → Local のユースケース
pub struct RelayUseCase {
    repository: Arc<dyn ConnectionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    instance: InstanceId,
    reporter: Arc<dyn ErrorReporter>,
}

impl RelayUseCase {
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        instance: InstanceId,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            instance,
            reporter,
        }
    }

    /// count トピックのペイロードを接続数として解釈する
    ///
    /// 負の値は 0 として扱う。整数でないペイロードは報告したうえでエラーを返す。
    pub fn accept_count_update(&self, payload: &str) -> Result<ConnectionCount, RelayError> {
        match payload.trim().parse::<i64>() {
            Ok(raw) => Ok(ConnectionCount::clamped(raw)),
            Err(_) => {
                let error = RelayError::MalformedCount(payload.to_string());
                self.reporter
                    .report(FailureKind::Delivery, "relay.count_update", &error);
                Err(error)
            }
        }
    }

    /// message トピックのペイロードから ChatMessage を組み立てる
    ///
    /// ID と時刻はこのインスタンスで割り当てる。
    pub fn accept_new_message(&self, payload: String) -> ChatMessage {
        ChatMessage::relayed(
            MessageText::relayed(payload),
            self.clock.as_ref(),
            self.instance.clone(),
        )
    }

    /// 現在ローカルに接続している全クライアントへ送信する
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 届けられたクライアント数
    pub async fn broadcast_to_local(&self, content: &str) -> Result<usize, RelayError> {
        let targets = self.repository.get_all_connected_handles().await;
        if targets.is_empty() {
            return Ok(0);
        }

        let delivered = self
            .message_pusher
            .broadcast(targets, content)
            .await
            .map_err(|e| {
                self.reporter
                    .report(FailureKind::Delivery, "relay.broadcast", &e);
                RelayError::from(e)
            })?;
        tracing::debug!(delivered, "Relayed payload to local clients");
        Ok(delivered)
    }
}
