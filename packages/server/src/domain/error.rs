//! Domain error types.

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("message text is too long ({length} > {max} characters)")]
    MessageTooLong { length: usize, max: usize },

    #[error("instance id must not be empty")]
    EmptyInstanceId,

    #[error("invalid room id: '{0}'")]
    InvalidRoomId(String),
}

/// Room エンティティの操作エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("client handle '{0}' is already registered")]
    DuplicateHandle(String),
}

/// ConnectionRepository のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("client handle '{0}' is already registered")]
    DuplicateHandle(String),

    #[error("client handle '{0}' is not registered")]
    ConnectionNotFound(String),
}

impl From<RoomError> for RepositoryError {
    fn from(error: RoomError) -> Self {
        match error {
            RoomError::DuplicateHandle(handle) => Self::DuplicateHandle(handle),
        }
    }
}

/// Shared Counter Store のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// ストアに到達できない（タイムアウト、接続断など）
    #[error("counter store unavailable: {0}")]
    Unavailable(String),

    /// キーに整数以外の値が入っている
    #[error("counter store holds a non-integer value: {0}")]
    InvalidValue(String),
}

/// Broadcast Bus のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("bus unavailable: {0}")]
    Unavailable(String),

    #[error("failed to publish to '{topic}': {reason}")]
    PublishFailed { topic: String, reason: String },

    #[error("failed to subscribe to '{topic}': {reason}")]
    SubscribeFailed { topic: String, reason: String },
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
