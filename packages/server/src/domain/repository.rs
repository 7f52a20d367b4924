//! Repository trait 定義
//!
//! ドメイン層が必要とする接続レジストリのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ClientHandle, Connection, RepositoryError, Room, Timestamp};

/// Connection Repository trait
///
/// インスタンスごとのローカル接続レジストリ。
/// ローカル接続数は別の変数で数えず、常にレジストリのサイズから求める。
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Room エンティティを取得
    async fn get_room(&self) -> Result<Room, RepositoryError>;

    /// 接続を追加
    async fn add_connection(
        &self,
        handle: ClientHandle,
        connected_at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// 共有カウンタへの加算が済んだ接続として印を付ける
    async fn mark_counted(&self, handle: &ClientHandle) -> Result<(), RepositoryError>;

    /// 接続を削除して返す（既に削除済みなら `None`）
    async fn remove_connection(&self, handle: &ClientHandle) -> Option<Connection>;

    /// 全ての接続を削除して返す
    async fn drain_connections(&self) -> Vec<Connection>;

    /// 接続中の全てのハンドルを取得
    async fn get_all_connected_handles(&self) -> Vec<ClientHandle>;

    /// 接続中のクライアント数を取得
    async fn count_connections(&self) -> usize;
}
