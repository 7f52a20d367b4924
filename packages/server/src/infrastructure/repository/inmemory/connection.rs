//! InMemory Connection Repository 実装
//!
//! ドメイン層が定義する ConnectionRepository trait の具体的な実装。
//! Room ドメインモデルをそのままインメモリのレジストリとして使用します。
//!
//! ローカル接続はプロセスと寿命を共にするため、永続化は不要です。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ClientHandle, Connection, ConnectionRepository, RepositoryError, Room, Timestamp,
};

/// インメモリ Connection Repository 実装
pub struct InMemoryConnectionRepository {
    /// Room ドメインモデル
    room: Arc<Mutex<Room>>,
}

impl InMemoryConnectionRepository {
    /// 新しい InMemoryConnectionRepository を作成
    pub fn new(room: Arc<Mutex<Room>>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn get_room(&self) -> Result<Room, RepositoryError> {
        let room = self.room.lock().await;
        Ok(room.clone())
    }

    async fn add_connection(
        &self,
        handle: ClientHandle,
        connected_at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut room = self.room.lock().await;
        room.add_connection(Connection::new(handle, connected_at))?;
        Ok(())
    }

    async fn mark_counted(&self, handle: &ClientHandle) -> Result<(), RepositoryError> {
        let mut room = self.room.lock().await;
        if room.mark_counted(handle) {
            Ok(())
        } else {
            Err(RepositoryError::ConnectionNotFound(handle.to_string()))
        }
    }

    async fn remove_connection(&self, handle: &ClientHandle) -> Option<Connection> {
        let mut room = self.room.lock().await;
        room.remove_connection(handle)
    }

    async fn drain_connections(&self) -> Vec<Connection> {
        let mut room = self.room.lock().await;
        room.drain()
    }

    async fn get_all_connected_handles(&self) -> Vec<ClientHandle> {
        let room = self.room.lock().await;
        room.connections.iter().map(|c| c.handle).collect()
    }

    async fn count_connections(&self) -> usize {
        let room = self.room.lock().await;
        room.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoomId;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryConnectionRepository の登録・削除・drain
    // - counted フラグの更新
    //
    // 【なぜこのテストが必要か】
    // - レジストリのサイズがシャットダウン時の補正量になる
    // - 削除の冪等性が「1 ハンドルにつき decrement は高々 1 回」を支えている
    //
    // 【どのようなシナリオをテストするか】
    // 1. 接続追加の成功ケース
    // 2. 重複ハンドルの追加（エラーケース）
    // 3. 削除の冪等性
    // 4. 存在しない接続の mark_counted（エラーケース）
    // 5. drain で全件取り出し
    // ========================================

    fn create_test_repository() -> InMemoryConnectionRepository {
        let room = Arc::new(Mutex::new(Room::new(
            RoomId::new("chat".to_string()).expect("Failed to create RoomId"),
        )));
        InMemoryConnectionRepository::new(room)
    }

    #[tokio::test]
    async fn test_add_connection_success() {
        // テスト項目: 接続を追加すると room に反映される
        // given (前提条件):
        let repo = create_test_repository();
        let handle = ClientHandle::generate();

        // when (操作):
        let result = repo.add_connection(handle, Timestamp::new(1000)).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(repo.count_connections().await, 1);

        let room = repo.get_room().await.unwrap();
        assert_eq!(room.connections[0].handle, handle);
        assert_eq!(room.connections[0].connected_at.value(), 1000);
        assert!(!room.connections[0].counted);
    }

    #[tokio::test]
    async fn test_add_duplicate_connection_fails() {
        // テスト項目: 同じハンドルの二重登録はエラーになる
        // given (前提条件):
        let repo = create_test_repository();
        let handle = ClientHandle::generate();
        repo.add_connection(handle, Timestamp::new(1000))
            .await
            .unwrap();

        // when (操作):
        let result = repo.add_connection(handle, Timestamp::new(2000)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::DuplicateHandle(handle.to_string()))
        );
        assert_eq!(repo.count_connections().await, 1);
    }

    #[tokio::test]
    async fn test_remove_connection_is_idempotent() {
        // テスト項目: 削除済みの接続を再度削除しても何も返らない（冪等性）
        // given (前提条件):
        let repo = create_test_repository();
        let handle = ClientHandle::generate();
        repo.add_connection(handle, Timestamp::new(1000))
            .await
            .unwrap();

        // when (操作):
        let first = repo.remove_connection(&handle).await;
        let second = repo.remove_connection(&handle).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(repo.count_connections().await, 0);
    }

    #[tokio::test]
    async fn test_mark_counted_unknown_handle() {
        // テスト項目: 存在しない接続に counted を付けようとするとエラー
        // given (前提条件):
        let repo = create_test_repository();
        let handle = ClientHandle::generate();

        // when (操作):
        let result = repo.mark_counted(&handle).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::ConnectionNotFound(handle.to_string()))
        );
    }

    #[tokio::test]
    async fn test_drain_connections() {
        // テスト項目: drain で全接続が取り出され、counted フラグも保持される
        // given (前提条件):
        let repo = create_test_repository();
        let alice = ClientHandle::generate();
        let bob = ClientHandle::generate();
        repo.add_connection(alice, Timestamp::new(1)).await.unwrap();
        repo.add_connection(bob, Timestamp::new(2)).await.unwrap();
        repo.mark_counted(&alice).await.unwrap();

        // when (操作):
        let drained = repo.drain_connections().await;

        // then (期待する結果):
        assert_eq!(drained.len(), 2);
        assert_eq!(drained.iter().filter(|c| c.counted).count(), 1);
        assert_eq!(repo.count_connections().await, 0);
        assert!(repo.get_all_connected_handles().await.is_empty());
    }
}
