//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - WebSocket 接続ごとの `UnboundedSender` を管理
//! - 接続中のクライアントへのブロードキャスト
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! sender を登録解除すると受信側のループが終了し、WebSocket も閉じられます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientHandle, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let clients = Arc::new(Mutex::new(HashMap::new()));
/// let pusher = WebSocketMessagePusher::new(clients.clone());
///
/// pusher.register_client(handle, tx).await;
/// let delivered = pusher.broadcast(vec![handle], "{\"type\":\"count-update\",\"count\":1}").await?;
/// ```
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    clients: Arc<Mutex<HashMap<ClientHandle, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: Arc<Mutex<HashMap<ClientHandle, PusherChannel>>>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, handle: ClientHandle, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(handle, sender);
        tracing::debug!("Client '{}' registered to MessagePusher", handle);
    }

    async fn unregister_client(&self, handle: &ClientHandle) -> bool {
        let mut clients = self.clients.lock().await;
        let removed = clients.remove(handle).is_some();
        if removed {
            tracing::debug!("Client '{}' unregistered from MessagePusher", handle);
        }
        removed
    }

    async fn broadcast(
        &self,
        targets: Vec<ClientHandle>,
        content: &str,
    ) -> Result<usize, MessagePushError> {
        let clients = self.clients.lock().await;
        let mut delivered = 0;

        for target in targets {
            match clients.get(&target) {
                // 既に閉じたチャンネルへの送信は捨てる（再送しない）
                Some(sender) => match sender.send(content.to_string()) {
                    Ok(()) => delivered += 1,
                    Err(_) => tracing::debug!("Client '{}' channel closed, dropping", target),
                },
                None => tracing::debug!("Client '{}' not found during broadcast, skipping", target),
            }
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - broadcast: 複数クライアントへの送信と、閉じたチャンネルの扱い
    // - unregister_client: sender が drop され、受信側が終了すること
    // ========================================

    fn create_test_pusher() -> (
        WebSocketMessagePusher,
        Arc<Mutex<HashMap<ClientHandle, PusherChannel>>>,
    ) {
        let clients = Arc::new(Mutex::new(HashMap::new()));
        let pusher = WebSocketMessagePusher::new(clients.clone());
        (pusher, clients)
    }

    #[tokio::test]
    async fn test_broadcast_success() {
        // テスト項目: 複数のクライアントにメッセージをブロードキャストできる
        // given (前提条件):
        let (pusher, clients) = create_test_pusher();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let alice = ClientHandle::generate();
        let bob = ClientHandle::generate();

        {
            let mut clients_lock = clients.lock().await;
            clients_lock.insert(alice, tx1);
            clients_lock.insert(bob, tx2);
        }

        // when (操作):
        let result = pusher.broadcast(vec![alice, bob], "Broadcast message").await;

        // then (期待する結果):
        assert_eq!(result, Ok(2));
        assert_eq!(rx1.recv().await, Some("Broadcast message".to_string()));
        assert_eq!(rx2.recv().await, Some("Broadcast message".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_drops_closed_channels() {
        // テスト項目: 閉じたチャンネルや未登録のクライアントは数えずにスキップする
        // given (前提条件):
        let (pusher, _clients) = create_test_pusher();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel::<String>();
        let alice = ClientHandle::generate();
        let closed = ClientHandle::generate();
        let unknown = ClientHandle::generate();
        pusher.register_client(alice, tx1).await;
        pusher.register_client(closed, tx2).await;
        drop(rx2);

        // when (操作):
        let result = pusher
            .broadcast(vec![alice, closed, unknown], "Broadcast message")
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(1));
        assert_eq!(rx1.recv().await, Some("Broadcast message".to_string()));
    }

    #[tokio::test]
    async fn test_unregister_client_closes_channel() {
        // テスト項目: 登録解除すると sender が drop され、受信側は None を受け取る
        // given (前提条件):
        let (pusher, _clients) = create_test_pusher();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let handle = ClientHandle::generate();
        pusher.register_client(handle, tx).await;

        // when (操作):
        let first = pusher.unregister_client(&handle).await;
        let second = pusher.unregister_client(&handle).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(rx.recv().await, None);
    }
}
