//! REPL command parsing for the chat client.
//!
//! Plain input is chat text; lines starting with `/` are commands.

/// A parsed line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send text to the current room, or globally when no room is joined
    Say(String),
    /// Join a room (becomes the current room)
    Join(String),
    /// Leave the current room
    Leave,
    /// Send a private message to a connection id
    PrivateMessage { to: String, message: String },
    /// Update the typing indicator in the current room
    Typing(bool),
    /// Exit the client
    Quit,
}

/// Parse one non-empty line of input.
///
/// Returns a usage hint string on malformed commands.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let mut parts = rest.splitn(2, ' ');
    let keyword = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();

    match keyword {
        "join" => {
            if arg.is_empty() {
                Err("usage: /join <room>".to_string())
            } else {
                Ok(Command::Join(arg.to_string()))
            }
        }
        "leave" => Ok(Command::Leave),
        "pm" => {
            let mut pm = arg.splitn(2, ' ');
            let to = pm.next().unwrap_or("").trim();
            let message = pm.next().unwrap_or("").trim();
            if to.is_empty() || message.is_empty() {
                Err("usage: /pm <connection-id> <message>".to_string())
            } else {
                Ok(Command::PrivateMessage {
                    to: to.to_string(),
                    message: message.to_string(),
                })
            }
        }
        "typing" => match arg {
            "on" => Ok(Command::Typing(true)),
            "off" => Ok(Command::Typing(false)),
            _ => Err("usage: /typing <on|off>".to_string()),
        },
        "quit" => Ok(Command::Quit),
        other => Err(format!("unknown command: /{}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_say_command() {
        // テスト項目: `/` で始まらない入力がそのまま発言になる
        // given (前提条件):
        let line = "hello everyone";

        // when (操作):
        let command = parse(line).unwrap();

        // then (期待する結果):
        assert_eq!(command, Command::Say("hello everyone".to_string()));
    }

    #[test]
    fn test_join_command_requires_room_name() {
        // テスト項目: /join にルーム名がないと使い方が返る
        // given (前提条件):

        // when (操作):
        let ok = parse("/join general").unwrap();
        let err = parse("/join");

        // then (期待する結果):
        assert_eq!(ok, Command::Join("general".to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn test_pm_command_splits_target_and_message() {
        // テスト項目: /pm が宛先と本文に分割される
        // given (前提条件):
        let line = "/pm 123e4567-e89b-12d3-a456-426614174000 hi there";

        // when (操作):
        let command = parse(line).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            Command::PrivateMessage {
                to: "123e4567-e89b-12d3-a456-426614174000".to_string(),
                message: "hi there".to_string(),
            }
        );
    }

    #[test]
    fn test_typing_command_accepts_on_and_off() {
        // テスト項目: /typing が on/off だけを受け付ける
        // given (前提条件):

        // when (操作):
        let on = parse("/typing on").unwrap();
        let off = parse("/typing off").unwrap();
        let bad = parse("/typing maybe");

        // then (期待する結果):
        assert_eq!(on, Command::Typing(true));
        assert_eq!(off, Command::Typing(false));
        assert!(bad.is_err());
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        // テスト項目: 未知のコマンドが使い方のヒント付きで拒否される
        // given (前提条件):

        // when (操作):
        let result = parse("/dance");

        // then (期待する結果):
        assert_eq!(result, Err("unknown command: /dance".to_string()));
    }
}
