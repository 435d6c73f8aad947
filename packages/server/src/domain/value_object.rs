//! ドメイン層の値オブジェクト定義
//!
//! 文字列や数値をそのまま引き回さず、検証済みの型として扱います。
//! コンストラクタは検証に失敗すると `ValidationError` を返します。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// 表示名の最大長（文字数）
pub const MAX_USER_NAME_CHARS: usize = 64;
/// ルーム名の最大長（文字数）
pub const MAX_ROOM_NAME_CHARS: usize = 64;
/// メッセージ本文の最大長（文字数）
pub const MAX_MESSAGE_BODY_CHARS: usize = 2000;

/// 接続 ID
///
/// トランスポート接続 1 本に対応する、プロセス存続期間中一意な識別子。
/// 生成はコーディネーターのみが行う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// 新しい接続 ID を生成する
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// 文字列表現から復元する（プライベートメッセージの宛先指定に使用）
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValidationError::InvalidConnectionId(value.to_string()))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// メッセージ ID（永続化時に採番される）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// 新しいメッセージ ID を生成する
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 表示名
///
/// 前後の空白を除いた上で空でないこと、最大長以下であることを保証する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUserName);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_USER_NAME_CHARS {
            return Err(ValidationError::UserNameTooLong(chars));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 表示名が未登録の接続の送信者名
    pub fn anonymous() -> Self {
        Self("Anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ルーム名
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyRoomName);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_ROOM_NAME_CHARS {
            return Err(ValidationError::RoomNameTooLong(chars));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// メッセージ本文
///
/// 空白のみの本文は空とみなして拒否する。本文そのものは加工しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyMessageBody);
        }
        let chars = value.chars().count();
        if chars > MAX_MESSAGE_BODY_CHARS {
            return Err(ValidationError::MessageBodyTooLong(chars));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// タイムスタンプ（Unix ミリ秒、UTC）
///
/// メッセージのタイムスタンプは常にコーディネーターが受付時に採番し、
/// クライアントの申告値は信用しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_is_trimmed() {
        // テスト項目: 表示名の前後の空白が除去される
        // given (前提条件):
        let raw = "  alice  ".to_string();

        // when (操作):
        let name = UserName::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(name.as_str(), "alice");
    }

    #[test]
    fn test_empty_user_name_is_rejected() {
        // テスト項目: 空白のみの表示名が拒否される
        // given (前提条件):
        let raw = "   ".to_string();

        // when (操作):
        let result = UserName::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::EmptyUserName));
    }

    #[test]
    fn test_too_long_user_name_is_rejected() {
        // テスト項目: 最大長を超える表示名が拒否される
        // given (前提条件):
        let raw = "x".repeat(MAX_USER_NAME_CHARS + 1);

        // when (操作):
        let result = UserName::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValidationError::UserNameTooLong(MAX_USER_NAME_CHARS + 1))
        );
    }

    #[test]
    fn test_empty_room_name_is_rejected() {
        // テスト項目: 空のルーム名が拒否される
        // given (前提条件):
        let raw = "".to_string();

        // when (操作):
        let result = RoomName::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::EmptyRoomName));
    }

    #[test]
    fn test_message_body_keeps_original_text() {
        // テスト項目: 本文は検証のみ行い、内容は加工されない
        // given (前提条件):
        let raw = "  hello world  ".to_string();

        // when (操作):
        let body = MessageBody::new(raw.clone()).unwrap();

        // then (期待する結果):
        assert_eq!(body.as_str(), raw);
    }

    #[test]
    fn test_whitespace_only_message_body_is_rejected() {
        // テスト項目: 空白のみの本文が空として拒否される
        // given (前提条件):
        let raw = " \t\n ".to_string();

        // when (操作):
        let result = MessageBody::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::EmptyMessageBody));
    }

    #[test]
    fn test_connection_id_roundtrips_through_string() {
        // テスト項目: 接続 ID が文字列表現から復元できる
        // given (前提条件):
        let conn = ConnectionId::generate();

        // when (操作):
        let parsed = ConnectionId::parse(&conn.to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(parsed, conn);
    }

    #[test]
    fn test_invalid_connection_id_is_rejected() {
        // テスト項目: UUID でない宛先指定が拒否される
        // given (前提条件):
        let raw = "not-a-uuid";

        // when (操作):
        let result = ConnectionId::parse(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValidationError::InvalidConnectionId(raw.to_string()))
        );
    }

    #[test]
    fn test_generated_connection_ids_are_unique() {
        // テスト項目: 生成された接続 ID が一意である
        // given (前提条件):

        // when (操作):
        let first = ConnectionId::generate();
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }
}
