//! UseCase: シャットダウン時の共有カウンタの補正
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ReconcileShutdownUseCase::execute() / execute_within()
//! - ローカルに残っている K 個の接続分だけ、共有カウンタを一度の set で減らす
//!
//! ### なぜこのテストが必要か
//! - 強制終了で個別の切断処理が走らなくても、カウンタが K だけ減ること
//! - 既に不整合なカウンタ（K より小さい値）でも 0 未満にならないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：K > 0、K = 0
//! - 異常系：カウンタが K より小さい、ストア障害、猶予時間切れ

use std::{sync::Arc, time::Duration};

use crate::domain::{
    BroadcastBus, ConnectionRepository, CounterStore, ErrorReporter, FailureKind, MessagePusher,
    RoomChannels,
};

use super::error::ReconcileError;

/// 補正の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// レジストリから回収した接続数
    pub drained: usize,
    /// カウンタから差し引いた数（加算済みの接続のみ）
    pub subtracted: usize,
    /// 補正前のカウンタ値（補正不要なら `None`）
    pub previous: Option<i64>,
    /// 補正後のカウンタ値（補正不要なら `None`）
    pub current: Option<i64>,
}

/// シャットダウン補正のユースケース
pub struct ReconcileShutdownUseCase {
    repository: Arc<dyn ConnectionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    counter_store: Arc<dyn CounterStore>,
    bus: Arc<dyn BroadcastBus>,
    channels: RoomChannels,
    reporter: Arc<dyn ErrorReporter>,
}

impl ReconcileShutdownUseCase {
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

    /// 補正を実行
    ///
    /// 1. レジストリを空にする（以降のソケットの切断処理は NotConnected で何もしない）
    /// 2. 送信チャンネルを登録解除する（ソケットが閉じられる）
    /// 3. 加算済みの接続が K > 0 個あれば `max(0, current - K)` を set し、新しい値を publish する
    pub async fn execute(&self) -> Result<ReconcileOutcome, ReconcileError> {
        let drained = self.repository.drain_connections().await;
        for connection in &drained {
            self.message_pusher
                .unregister_client(&connection.handle)
                .await;
        }
        let subtracted = drained.iter().filter(|c| c.counted).count();
        tracing::info!(
            drained = drained.len(),
            subtracted,
            "Reconciling shared connection count"
        );

        if subtracted == 0 {
            return Ok(ReconcileOutcome {
                drained: drained.len(),
                subtracted,
                previous: None,
                current: None,
            });
        }

        let key = &self.channels.counter_key;
        let previous = self.counter_store.get(key).await?;
        let current = previous.saturating_sub(subtracted as i64).max(0);
        self.counter_store.set(key, current).await?;

        if let Err(e) = self
            .bus
            .publish(&self.channels.count_topic, &current.to_string())
            .await
        {
            self.reporter
                .report(FailureKind::Publish, "reconcile.publish_count", &e);
        }

        Ok(ReconcileOutcome {
            drained: drained.len(),
            subtracted,
            previous: Some(previous),
            current: Some(current),
        })
    }

    /// 猶予時間内で補正を実行する。失敗・時間切れは報告する
    pub async fn execute_within(
        &self,
        grace: Duration,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let result = match tokio::time::timeout(grace, self.execute()).await {
            Ok(result) => result,
            Err(_) => Err(ReconcileError::GracePeriodElapsed(grace)),
        };
        if let Err(e) = &result {
            self.reporter
                .report(FailureKind::Reconcile, "reconcile.execute", e);
        }
        result
    }
}
