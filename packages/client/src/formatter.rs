//! Message formatting utilities for client display.

use chrono::{DateTime, Utc};

use idobata_server::domain::{ChatMessage, ServerEvent};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format one server event for the terminal.
    ///
    /// Returns an empty string for events that need no output.
    pub fn format_event(event: &ServerEvent, current_username: &str) -> String {
        match event {
            ServerEvent::UserList { users } => {
                let names: Vec<&str> = users.iter().map(|name| name.as_str()).collect();
                format!("\nOnline: {}\n", names.join(", "))
            }
            ServerEvent::UserJoined { username, id } => {
                if username.as_str() == current_username {
                    format!("\nYour connection id is {}\n", id)
                } else {
                    format!("\n+ {} joined the chat\n", username)
                }
            }
            ServerEvent::UserLeft { username, .. } => {
                format!("\n- {} left the chat\n", username)
            }
            ServerEvent::JoinedRoom { room } => {
                format!("\nJoined room '{}'\n", room)
            }
            ServerEvent::RoomMessages { room, messages } => {
                let mut output = String::new();
                output.push_str(
                    "\n\n============================================================\n",
                );
                output.push_str(&format!("Messages in '{}':\n", room));
                if messages.is_empty() {
                    output.push_str("(no messages yet)\n");
                } else {
                    for persisted in messages {
                        output.push_str(&Self::format_chat_line(&persisted.message));
                    }
                }
                output.push_str(
                    "============================================================\n",
                );
                output
            }
            ServerEvent::RoomUserJoined { username, room } => {
                let is_me = username.as_str() == current_username;
                let me_suffix = if is_me { " (me)" } else { "" };
                format!("\n+ {}{} entered {}\n", username, me_suffix, room)
            }
            ServerEvent::RoomUserLeft { username, room } => {
                format!("\n- {} left {}\n", username, room)
            }
            ServerEvent::ReceiveMessage { message }
            | ServerEvent::ReceiveRoomMessage { message } => {
                format!("\n{}", Self::format_chat_line(message))
            }
            ServerEvent::PrivateMessage { message } => {
                format!("\n(private) {}", Self::format_chat_line(message))
            }
            ServerEvent::TypingUsers { room, users } => {
                if users.is_empty() {
                    String::new()
                } else {
                    let names: Vec<&str> = users.iter().map(|name| name.as_str()).collect();
                    format!("\n(typing in {}: {})\n", room, names.join(", "))
                }
            }
        }
    }

    /// Format a message that could not be parsed as a server event
    pub fn format_raw_message(text: &str) -> String {
        format!("\n{}\n", text)
    }

    /// One chat line: `[HH:MM:SS] sender: body`, with the room in brackets
    /// for room messages.
    fn format_chat_line(message: &ChatMessage) -> String {
        let time = Self::format_time(message.timestamp.value());
        match &message.room {
            Some(room) => format!(
                "[{}] [{}] {}: {}\n",
                time,
                room,
                message.sender,
                message.body.as_str()
            ),
            None => format!("[{}] {}: {}\n", time, message.sender, message.body.as_str()),
        }
    }

    fn format_time(timestamp_millis: i64) -> String {
        match DateTime::<Utc>::from_timestamp_millis(timestamp_millis) {
            Some(dt) => dt.format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idobata_server::domain::{
        ConnectionId, MessageBody, RoomName, Timestamp, UserName,
    };

    fn message(room: Option<&str>, body: &str) -> ChatMessage {
        ChatMessage {
            seq: 0,
            sender: UserName::new("alice".to_string()).unwrap(),
            sender_connection: ConnectionId::generate(),
            body: MessageBody::new(body.to_string()).unwrap(),
            room: room.map(|r| RoomName::new(r.to_string()).unwrap()),
            is_private: false,
            // 2023-01-01 12:34:56 UTC
            timestamp: Timestamp::new(1672576496000),
        }
    }

    #[test]
    fn test_room_message_line_includes_room_and_time() {
        // テスト項目: ルームメッセージの表示にルーム名と時刻が含まれる
        // given (前提条件):
        let event = ServerEvent::ReceiveRoomMessage {
            message: message(Some("general"), "hi"),
        };

        // when (操作):
        let formatted = MessageFormatter::format_event(&event, "bob");

        // then (期待する結果):
        assert!(formatted.contains("[general]"));
        assert!(formatted.contains("alice: hi"));
        assert!(formatted.contains("12:34:56"));
    }

    #[test]
    fn test_empty_typing_list_produces_no_output() {
        // テスト項目: 入力中の利用者がいない typing_users は表示しない
        // given (前提条件):
        let event = ServerEvent::TypingUsers {
            room: RoomName::new("general".to_string()).unwrap(),
            users: vec![],
        };

        // when (操作):
        let formatted = MessageFormatter::format_event(&event, "bob");

        // then (期待する結果):
        assert!(formatted.is_empty());
    }

    #[test]
    fn test_own_user_joined_shows_connection_id() {
        // テスト項目: 自分の user_joined では接続 ID が案内される
        // given (前提条件):
        let conn = ConnectionId::generate();
        let event = ServerEvent::UserJoined {
            username: UserName::new("alice".to_string()).unwrap(),
            id: conn,
        };

        // when (操作):
        let formatted = MessageFormatter::format_event(&event, "alice");

        // then (期待する結果):
        assert!(formatted.contains(&conn.to_string()));
    }
}
