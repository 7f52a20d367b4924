//! Entities of the relay domain.

use hiroba_shared::time::Clock;

use super::{
    error::RoomError,
    value_object::{ClientHandle, InstanceId, MessageId, MessageText, RoomId, Timestamp},
};

/// ローカル接続 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub handle: ClientHandle,
    pub connected_at: Timestamp,
    /// 共有カウンタへの increment が成功したかどうか
    ///
    /// counted な接続だけが切断時・シャットダウン時にカウンタから差し引かれる。
    pub counted: bool,
}

impl Connection {
    pub fn new(handle: ClientHandle, connected_at: Timestamp) -> Self {
        Self {
            handle,
            connected_at,
            counted: false,
        }
    }
}

/// このインスタンスから見たルーム（ローカル接続の集合）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub connections: Vec<Connection>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            connections: Vec::new(),
        }
    }

    pub fn add_connection(&mut self, connection: Connection) -> Result<(), RoomError> {
        if self.contains(&connection.handle) {
            return Err(RoomError::DuplicateHandle(connection.handle.to_string()));
        }
        self.connections.push(connection);
        Ok(())
    }

    /// 接続を取り除いて返す。既に取り除かれていれば `None`
    pub fn remove_connection(&mut self, handle: &ClientHandle) -> Option<Connection> {
        let index = self.connections.iter().position(|c| &c.handle == handle)?;
        Some(self.connections.swap_remove(index))
    }

    /// 接続を counted にする。接続が存在しなければ `false`
    pub fn mark_counted(&mut self, handle: &ClientHandle) -> bool {
        match self.connections.iter_mut().find(|c| &c.handle == handle) {
            Some(connection) => {
                connection.counted = true;
                true
            }
            None => false,
        }
    }

    /// 全ての接続を取り除いて返す
    pub fn drain(&mut self) -> Vec<Connection> {
        std::mem::take(&mut self.connections)
    }

    pub fn contains(&self, handle: &ClientHandle) -> bool {
        self.connections.iter().any(|c| &c.handle == handle)
    }
}

/// リレーされたチャットメッセージ
///
/// Bus から本文を受け取った時点で、受信インスタンスが ID・時刻・送出元を割り当てる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: MessageText,
    pub created_at: Timestamp,
    pub origin_instance: InstanceId,
}

impl ChatMessage {
    pub fn relayed(text: MessageText, clock: &dyn Clock, origin_instance: InstanceId) -> Self {
        Self {
            id: MessageId::generate(),
            text,
            created_at: Timestamp::new(clock.now_millis()),
            origin_instance,
        }
    }
}
