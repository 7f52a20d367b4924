//! UseCase: クライアント接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::execute() メソッド
//! - ローカル登録 → 共有カウンタの increment → 接続数の publish
//!
//! ### なぜこのテストが必要か
//! - 接続したクライアント自身も、自分の接続による count-update を受け取れること
//! - increment に失敗しても接続は維持され、後で誤って decrement されないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続とカウンタの加算、publish
//! - 異常系：ストア障害、Bus 障害

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    BroadcastBus, ClientHandle, ConnectionCount, ConnectionRepository, CounterStore,
    ErrorReporter, FailureKind, MessagePusher, PusherChannel, RoomChannels, Timestamp,
};

use super::error::ConnectError;

/// 接続処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedClient {
    pub handle: ClientHandle,
    pub connected_at: Timestamp,
    /// increment 後の接続数（ストア障害時は `None`）
    pub count: Option<ConnectionCount>,
}

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// ローカル接続レジストリ
    repository: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 共有カウンタ
    counter_store: Arc<dyn CounterStore>,
    /// インスタンス間の Bus
    bus: Arc<dyn BroadcastBus>,
    channels: RoomChannels,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        counter_store: Arc<dyn CounterStore>,
        bus: Arc<dyn BroadcastBus>,
        channels: RoomChannels,
        clock: Arc<dyn Clock>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            counter_store,
            bus,
            channels,
            clock,
            reporter,
        }
    }

    /// クライアント接続を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectedClient)` - 接続成功（カウンタの更新に失敗しても接続は成功扱い）
    /// * `Err(ConnectError)` - ローカル登録に失敗
    pub async fn execute(&self, sender: PusherChannel) -> Result<ConnectedClient, ConnectError> {
        // 1. ローカルに登録（自分の接続による count-update も受け取れるよう、加算より先に行う）
        let handle = ClientHandle::generate();
        let connected_at = Timestamp::new(self.clock.now_millis());
        self.repository.add_connection(handle, connected_at).await?;
        self.message_pusher.register_client(handle, sender).await;

        // 2. 共有カウンタを加算
        let raw = match self.counter_store.increment(&self.channels.counter_key).await {
            Ok(raw) => raw,
            Err(e) => {
                // 接続は維持する。counted にならないので切断時にも減算されない
                self.reporter
                    .report(FailureKind::Counter, "connect.increment", &e);
                return Ok(ConnectedClient {
                    handle,
                    connected_at,
                    count: None,
                });
            }
        };
        if let Err(e) = self.repository.mark_counted(&handle).await {
            // 加算の途中で切断された: 自分の加算を取り消す
            if let Err(store_error) = self
                .counter_store
                .decrement(&self.channels.counter_key)
                .await
            {
                self.reporter
                    .report(FailureKind::Counter, "connect.compensate", &store_error);
            }
            return Err(e.into());
        }

        // 3. 新しい接続数を publish
        if let Err(e) = self
            .bus
            .publish(&self.channels.count_topic, &raw.to_string())
            .await
        {
            self.reporter
                .report(FailureKind::Publish, "connect.publish_count", &e);
        }

        Ok(ConnectedClient {
            handle,
            connected_at,
            count: Some(ConnectionCount::clamped(raw)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BusError, MockBroadcastBus, MockCounterStore, StoreError},
        infrastructure::{broadcast_bus::InMemoryBroadcastBus, counter_store::InMemoryCounterStore},
        usecase::test_helpers::{
            RecordingReporter, create_test_message_pusher, create_test_repository, test_channels,
        },
    };
    use hiroba_shared::time::FixedClock;
    use tokio::sync::mpsc;

    fn create_usecase(
        repository: Arc<dyn ConnectionRepository>,
        counter_store: Arc<dyn CounterStore>,
        bus: Arc<dyn BroadcastBus>,
        reporter: Arc<RecordingReporter>,
    ) -> ConnectClientUseCase {
        ConnectClientUseCase::new(
            repository,
            create_test_message_pusher(),
            counter_store,
            bus,
            test_channels(),
            Arc::new(FixedClock::new(1_000)),
            reporter,
        )
    }

    #[tokio::test]
    async fn test_connect_client_success() {
        // テスト項目: 接続するとレジストリに登録され、カウンタが加算され、接続数が publish される
        // given (前提条件):
        let repository = create_test_repository();
        let counter_store = Arc::new(InMemoryCounterStore::new());
        let bus = Arc::new(InMemoryBroadcastBus::new());
        let mut count_feed = bus.subscribe(&test_channels().count_topic).await.unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let usecase = create_usecase(
            repository.clone(),
            counter_store.clone(),
            bus.clone(),
            reporter.clone(),
        );

        // when (操作):
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = usecase.execute(tx).await.unwrap();

        // then (期待する結果):
        assert_eq!(result.count, Some(ConnectionCount::new(1)));
        assert_eq!(result.connected_at.value(), 1_000);
        assert_eq!(repository.count_connections().await, 1);
        let room = repository.get_room().await.unwrap();
        assert!(room.connections[0].counted);
        assert_eq!(
            counter_store
                .get(&test_channels().counter_key)
                .await
                .unwrap(),
            1
        );
        assert_eq!(count_feed.recv().await, Some("1".to_string()));
        assert!(reporter.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_connect_client_store_failure_keeps_connection_uncounted() {
        // テスト項目: increment に失敗しても接続は維持され、counted にはならない
        // given (前提条件):
        let repository = create_test_repository();
        let mut counter_store = MockCounterStore::new();
        counter_store
            .expect_increment()
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));
        let mut bus = MockBroadcastBus::new();
        bus.expect_publish().never();
        let reporter = Arc::new(RecordingReporter::default());
        let usecase = create_usecase(
            repository.clone(),
            Arc::new(counter_store),
            Arc::new(bus),
            reporter.clone(),
        );

        // when (操作):
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = usecase.execute(tx).await.unwrap();

        // then (期待する結果):
        assert_eq!(result.count, None);
        let room = repository.get_room().await.unwrap();
        assert_eq!(room.connections.len(), 1);
        assert!(!room.connections[0].counted);
        assert_eq!(reporter.kinds(), vec![FailureKind::Counter]);
    }

    #[tokio::test]
    async fn test_connect_client_publish_failure_is_reported() {
        // テスト項目: publish に失敗しても接続は成功し、失敗が報告される
        // given (前提条件):
        let repository = create_test_repository();
        let mut bus = MockBroadcastBus::new();
        bus.expect_publish().times(1).returning(|topic, _| {
            Err(BusError::PublishFailed {
                topic: topic.to_string(),
                reason: "broken pipe".to_string(),
            })
        });
        let reporter = Arc::new(RecordingReporter::default());
        let usecase = create_usecase(
            repository.clone(),
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(bus),
            reporter.clone(),
        );

        // when (操作):
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = usecase.execute(tx).await.unwrap();

        // then (期待する結果):
        assert_eq!(result.count, Some(ConnectionCount::new(1)));
        assert_eq!(reporter.kinds(), vec![FailureKind::Publish]);
        assert_eq!(reporter.operations(), vec!["connect.publish_count".to_string()]);
    }

    #[tokio::test]
    async fn test_connect_many_clients_assigns_distinct_handles() {
        // テスト項目: 複数の接続には別々のハンドルが振られ、カウンタは接続数と一致する
        // given (前提条件):
        let repository = create_test_repository();
        let counter_store = Arc::new(InMemoryCounterStore::new());
        let usecase = create_usecase(
            repository.clone(),
            counter_store.clone(),
            Arc::new(InMemoryBroadcastBus::new()),
            Arc::new(RecordingReporter::default()),
        );

        // when (操作):
        let mut handles = Vec::new();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::unbounded_channel();
            receivers.push(rx);
            handles.push(usecase.execute(tx).await.unwrap().handle);
        }

        // then (期待する結果):
        handles.sort_by_key(|h| *h.as_uuid());
        handles.dedup();
        assert_eq!(handles.len(), 3);
        assert_eq!(repository.count_connections().await, 3);
        assert_eq!(
            counter_store
                .get(&test_channels().counter_key)
                .await
                .unwrap(),
            3
        );
    }
}
