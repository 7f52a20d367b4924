//! MessagePusher trait 定義
//!
//! ローカルに接続しているクライアントへメッセージを届けるためのインターフェース。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{MessagePushError, value_object::ClientHandle};

/// クライアントへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, handle: ClientHandle, sender: PusherChannel);

    /// クライアントの送信チャンネルを登録解除（チャンネルは drop される）
    ///
    /// 登録されていた場合は `true`
    async fn unregister_client(&self, handle: &ClientHandle) -> bool;

    /// 複数のクライアントに送信し、届けられた数を返す
    ///
    /// 既に閉じているクライアントへの送信は単に捨てられる。
    async fn broadcast(
        &self,
        targets: Vec<ClientHandle>,
        content: &str,
    ) -> Result<usize, MessagePushError>;
}
