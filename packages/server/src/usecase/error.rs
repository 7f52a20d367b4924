//! UseCase 層のエラー型

use std::time::Duration;

use thiserror::Error;

use crate::domain::{BusError, MessagePushError, RepositoryError, StoreError};

/// 接続処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("failed to register connection: {0}")]
    Registry(#[from] RepositoryError),
}

/// 切断処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectError {
    /// 既に切断済み（またはシャットダウンで回収済み）のハンドル
    #[error("client '{0}' is not connected")]
    NotConnected(String),

    #[error("failed to decrement connection count: {0}")]
    Counter(#[from] StoreError),
}

/// Local → Bus のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishMessageError {
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Bus → Local のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("count payload is not a decimal integer: '{0}'")]
    MalformedCount(String),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}

/// シャットダウン時の補正のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("failed to correct connection count: {0}")]
    Counter(#[from] StoreError),

    #[error("reconciliation did not finish within {0:?}")]
    GracePeriodElapsed(Duration),
}
