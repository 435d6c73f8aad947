//! アウトバウンドイベント定義
//!
//! コーディネーターが接続へ配信するイベントの型。配信プロトコルは
//! コーディネーターが所有するため、イベント型もドメイン層に置く。
//! ワイヤ表現は `type` フィールドでタグ付けされた JSON。

use serde::{Deserialize, Serialize};

use super::{
    entity::{ChatMessage, PersistedMessage},
    value_object::{ConnectionId, RoomName, UserName},
};

/// サーバーから接続へ配信されるイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// オンライン利用者一覧（全接続へ）
    UserList { users: Vec<UserName> },
    /// 利用者が参加した（全接続へ）
    UserJoined {
        username: UserName,
        id: ConnectionId,
    },
    /// 利用者が離脱した（全接続へ）
    UserLeft {
        username: UserName,
        id: ConnectionId,
    },
    /// ルームへの join が受け付けられた（join した接続のみ）
    JoinedRoom { room: RoomName },
    /// ルームの履歴（join した接続のみ、古い順）
    RoomMessages {
        room: RoomName,
        messages: Vec<PersistedMessage>,
    },
    /// ルームに参加者が加わった（ルームの全メンバーへ）
    RoomUserJoined { username: UserName, room: RoomName },
    /// ルームから参加者が外れた（残りのメンバーへ）
    RoomUserLeft { username: UserName, room: RoomName },
    /// グローバルメッセージ（全接続へ）
    ReceiveMessage { message: ChatMessage },
    /// ルームメッセージ（ルームの全メンバーへ）
    ReceiveRoomMessage { message: ChatMessage },
    /// プライベートメッセージ（宛先と送信者本人へ）
    PrivateMessage { message: ChatMessage },
    /// ルームで入力中の表示名一覧（ルームの全メンバーへ）
    TypingUsers {
        room: RoomName,
        users: Vec<UserName>,
    },
}

impl ServerEvent {
    /// ワイヤ表現（JSON 文字列）へ変換する
    ///
    /// イベントは構築時点で直列化可能な値だけを持つ。
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ServerEvent should serialize")
    }
}
