//! Value objects of the relay domain.

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// メッセージ本文の最大文字数（コードポイント数）のデフォルト値
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 280;

/// ローカルに接続しているクライアント 1 セッションを表すハンドル
///
/// インスタンス内でのみ意味を持ち、他インスタンスには共有されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientHandle(Uuid);

impl ClientHandle {
    /// 新しいハンドルを払い出す
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// リレーされたメッセージの ID
///
/// 同じ論理メッセージでも、受信したインスタンスごとに別の ID が振られる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// メッセージ本文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    /// クライアントから受け取った本文を検証して作成する
    ///
    /// 文字数が `max_chars` を超える本文だけを拒否する。内容には手を加えない。
    pub fn new(text: String, max_chars: usize) -> Result<Self, ValueObjectError> {
        let length = text.chars().count();
        if length > max_chars {
            return Err(ValueObjectError::MessageTooLong {
                length,
                max: max_chars,
            });
        }
        Ok(Self(text))
    }

    /// Bus から受け取った本文をそのまま包む
    ///
    /// 長さの検証は送信元インスタンスのトランスポート境界で済んでいる。
    pub fn relayed(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// メッセージをリレーしたサーバーインスタンスの識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.trim().is_empty() {
            return Err(ValueObjectError::EmptyInstanceId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルーム ID
///
/// 現在はグローバルなルームが 1 つだけだが、キーやトピック名はルーム ID から導出する。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() || id.chars().any(|c| c.is_whitespace()) {
            return Err(ValueObjectError::InvalidRoomId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unix timestamp (milliseconds, UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 全インスタンス合計の接続クライアント数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConnectionCount(u64);

impl ConnectionCount {
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    /// ストアの生の値から作成する
    ///
    /// シャットダウン時の補正が競合すると一時的に負の値になりうるため、0 で下限を取る。
    pub fn clamped(raw: i64) -> Self {
        Self(raw.max(0) as u64)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// 共有カウンタのキー名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey(String);

impl CounterKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Broadcast Bus のトピック名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルームに対応するカウンタキーと 2 つのトピック
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomChannels {
    pub room: RoomId,
    /// 接続数カウンタのキー（`{room}:connection-count`）
    pub counter_key: CounterKey,
    /// 接続数更新のトピック（`{room}:connection-count-updated`）
    pub count_topic: Topic,
    /// 新着メッセージのトピック（`{room}:new-message`）
    pub message_topic: Topic,
}

impl RoomChannels {
    pub fn for_room(room: RoomId) -> Self {
        let prefix = room.as_str();
        Self {
            counter_key: CounterKey(format!("{prefix}:connection-count")),
            count_topic: Topic(format!("{prefix}:connection-count-updated")),
            message_topic: Topic(format!("{prefix}:new-message")),
            room,
        }
    }
}
