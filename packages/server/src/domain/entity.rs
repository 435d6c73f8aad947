//! ドメイン層のエンティティ定義

use serde::{Deserialize, Serialize};

use super::value_object::{ConnectionId, MessageBody, MessageId, RoomName, Timestamp, UserName};

/// 利用者
///
/// 最初の user_join でレコードが作られ、切断でも削除されず
/// `online` フラグだけが折られる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: UserName,
    pub online: bool,
}

/// ルームディレクトリのエントリ
///
/// 初回 join 時に遅延作成され、空になっても削除されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: RoomName,
    pub created_at: Timestamp,
}

/// チャットメッセージ
///
/// `seq` はコーディネーターが受付時に採番する受付順序番号で、
/// 配信順と履歴順の正準な順序キー。`timestamp` も受付時に採番される。
/// `room` はルームメッセージのときのみ存在し、プライベート／グローバル
/// メッセージでは存在しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub seq: u64,
    pub sender: UserName,
    pub sender_connection: ConnectionId,
    pub body: MessageBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomName>,
    pub is_private: bool,
    pub timestamp: Timestamp,
}

/// 永続化済みメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedMessage {
    pub id: MessageId,
    #[serde(flatten)]
    pub message: ChatMessage,
}
