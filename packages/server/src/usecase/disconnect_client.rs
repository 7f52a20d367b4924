//! UseCase: クライアント切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//! - レジストリからの削除 → 共有カウンタの decrement → 接続数の publish
//!
//! ### なぜこのテストが必要か
//! - 同じ接続の切断が二重に処理されてもカウンタが二重に減らないこと
//! - 加算されていない接続（ストア障害時の接続）は減算しないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：切断
//! - 異常系：二重切断、未加算の接続、ストア障害

use std::sync::Arc;

use crate::domain::{
    BroadcastBus, ClientHandle, ConnectionCount, ConnectionRepository, CounterStore,
    ErrorReporter, FailureKind, MessagePusher, RoomChannels,
};

use super::error::DisconnectError;

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    repository: Arc<dyn ConnectionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    counter_store: Arc<dyn CounterStore>,
    bus: Arc<dyn BroadcastBus>,
    channels: RoomChannels,
    reporter: Arc<dyn ErrorReporter>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        counter_store: Arc<dyn CounterStore>,
        bus: Arc<dyn BroadcastBus>,
        channels: RoomChannels,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            counter_store,
            bus,
            channels,
            reporter,
        }
    }

    /// クライアント切断を実行
    ///
    /// # Arguments
    ///
    /// * `handle` - 切断するクライアントのハンドル
    ///
    /// # Returns
    ///
    /// * `Ok(Some(ConnectionCount))` - decrement 後の接続数
    /// * `Ok(None)` - 加算されていない接続だったため、カウンタには触れなかった
    /// * `Err(DisconnectError::NotConnected)` - 既に切断済み
    /// * `Err(DisconnectError::Counter)` - decrement に失敗（報告済み）
    pub async fn execute(
        &self,
        handle: &ClientHandle,
    ) -> Result<Option<ConnectionCount>, DisconnectError> {
        // 1. レジストリから削除（削除できた呼び出しだけが減算する）
        let connection = self
            .repository
            .remove_connection(handle)
            .await
            .ok_or_else(|| DisconnectError::NotConnected(handle.to_string()))?;
        self.message_pusher.unregister_client(handle).await;

        if !connection.counted {
            return Ok(None);
        }

        // 2. 共有カウンタを減算
        let raw = match self.counter_store.decrement(&self.channels.counter_key).await {
            Ok(raw) => raw,
            Err(e) => {
                self.reporter
                    .report(FailureKind::Counter, "disconnect.decrement", &e);
                return Err(e.into());
            }
        };

        // 3. 新しい接続数を publish
        if let Err(e) = self
            .bus
            .publish(&self.channels.count_topic, &raw.to_string())
            .await
        {
            self.reporter
                .report(FailureKind::Publish, "disconnect.publish_count", &e);
        }

        Ok(Some(ConnectionCount::clamped(raw)))
    }
}
