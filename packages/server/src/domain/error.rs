//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("display name must not be empty")]
    EmptyUserName,

    #[error("display name is too long ({0} chars)")]
    UserNameTooLong(usize),

    #[error("room name must not be empty")]
    EmptyRoomName,

    #[error("room name is too long ({0} chars)")]
    RoomNameTooLong(usize),

    #[error("message body must not be empty")]
    EmptyMessageBody,

    #[error("message body is too long ({0} chars)")]
    MessageBodyTooLong(usize),

    #[error("invalid connection id: '{0}'")]
    InvalidConnectionId(String),
}

/// Persistence Port のエラー
///
/// どの失敗もコーディネーターにとって致命的ではなく、
/// 該当操作はインメモリのみの動作に縮退する。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation failed: {0}")]
    OperationFailed(String),
}

/// Broadcast Fan-out のエラー
#[derive(Debug, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
