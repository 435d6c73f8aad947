//! WebSocket の受信イベント DTO
//!
//! クライアントから届くイベントのワイヤ表現。`type` フィールドでタグ付け
//! された JSON を、検証前の素の文字列フィールドのまま受け取る。
//! ドメインの値オブジェクトへの変換（検証）はコーディネーターが行う。

use serde::{Deserialize, Serialize};

/// クライアントからサーバーへ送られるイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// 表示名の名乗り
    UserJoin { username: String },
    /// ルームへの参加
    JoinRoom { room: String },
    /// ルームからの退出
    LeaveRoom { room: String },
    /// グローバルメッセージの送信
    SendMessage { message: String },
    /// ルームメッセージの送信
    SendRoomMessage { room: String, message: String },
    /// プライベートメッセージの送信（`to` は宛先の接続 ID）
    PrivateMessage { to: String, message: String },
    /// 入力中状態の更新
    Typing { room: String, is_typing: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_join_event_parses_from_tagged_json() {
        // テスト項目: type タグ付きの JSON が対応するイベントに復元される
        // given (前提条件):
        let json = r#"{"type":"user_join","username":"alice"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::UserJoin {
                username: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_send_room_message_event_parses() {
        // テスト項目: ルームメッセージのイベントが復元される
        // given (前提条件):
        let json = r#"{"type":"send_room_message","room":"general","message":"hi"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::SendRoomMessage {
                room: "general".to_string(),
                message: "hi".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        // テスト項目: 未知の type タグがパースエラーになる
        // given (前提条件):
        let json = r#"{"type":"fly_to_the_moon"}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientEvent>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_typing_event_roundtrips() {
        // テスト項目: typing イベントがシリアライズ・復元で一致する
        // given (前提条件):
        let event = ClientEvent::Typing {
            room: "general".to_string(),
            is_typing: true,
        };

        // when (操作):
        let json = serde_json::to_string(&event).unwrap();
        let decoded: ClientEvent = serde_json::from_str(&json).unwrap();

        // then (期待する結果):
        assert_eq!(decoded, event);
    }
}
