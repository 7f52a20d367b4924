//! UseCase 層
//!
//! ドメインのポート（trait）だけに依存し、接続・切断・リレー・シャットダウン補正の
//! 手順を組み立てる。

pub mod connect_client;
pub mod disconnect_client;
pub mod error;
pub mod publish_message;
pub mod reconcile_shutdown;
pub mod relay;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use connect_client::{ConnectClientUseCase, ConnectedClient};
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ConnectError, DisconnectError, PublishMessageError, ReconcileError, RelayError};
pub use publish_message::PublishMessageUseCase;
pub use reconcile_shutdown::{ReconcileOutcome, ReconcileShutdownUseCase};
pub use relay::RelayUseCase;
