//! Server state shared by the handlers.

use std::sync::Arc;

use crate::{
    domain::{ConnectionRepository, InstanceId},
    usecase::{ConnectClientUseCase, DisconnectClientUseCase, PublishMessageUseCase},
};

/// Shared application state
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// PublishMessageUseCase（Local → Bus のユースケース）
    pub publish_message_usecase: Arc<PublishMessageUseCase>,
    /// ローカル接続レジストリ（デバッグ用の参照のみ）
    pub repository: Arc<dyn ConnectionRepository>,
    pub instance: InstanceId,
    /// 実際に listen しているポート
    pub port: u16,
    /// 受け付けるメッセージ本文の最大文字数
    pub max_message_length: usize,
}
