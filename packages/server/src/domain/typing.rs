//! Typing Tracker（入力中状態の管理）
//!
//! (接続, ルーム) 単位の入力中フラグ。揮発性で、永続化されることはなく、
//! ルーム退出または切断で消える。

use std::collections::{HashMap, HashSet};

use super::value_object::{ConnectionId, RoomName};

/// ルームごとの入力中接続の集合（true の状態だけを保持する）
#[derive(Debug, Default)]
pub struct TypingTracker {
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入力中状態を更新する。状態が変化したら true。
    pub fn set(&mut self, conn: ConnectionId, room: &RoomName, is_typing: bool) -> bool {
        if is_typing {
            self.rooms.entry(room.clone()).or_default().insert(conn)
        } else {
            self.clear_room(&conn, room)
        }
    }

    /// (接続, ルーム) の状態を消す。入力中だった場合は true。
    pub fn clear_room(&mut self, conn: &ConnectionId, room: &RoomName) -> bool {
        let Some(typing) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = typing.remove(conn);
        if typing.is_empty() {
            self.rooms.remove(room);
        }
        removed
    }

    /// 接続の全状態を消し、入力中だったルームを返す（ソート済み）。
    pub fn clear_connection(&mut self, conn: &ConnectionId) -> Vec<RoomName> {
        let mut cleared: Vec<RoomName> = self
            .rooms
            .iter()
            .filter(|(_, typing)| typing.contains(conn))
            .map(|(room, _)| room.clone())
            .collect();
        cleared.sort();
        for room in &cleared {
            self.clear_room(conn, room);
        }
        cleared
    }

    /// ルームで入力中の接続一覧
    pub fn typing_in(&self, room: &RoomName) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|typing| typing.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_set_typing_true_registers_connection() {
        // テスト項目: typing=true でルームの入力中一覧に現れる
        // given (前提条件):
        let mut tracker = TypingTracker::new();
        let conn = ConnectionId::generate();

        // when (操作):
        let changed = tracker.set(conn, &room("general"), true);

        // then (期待する結果):
        assert!(changed);
        assert_eq!(tracker.typing_in(&room("general")), vec![conn]);
    }

    #[test]
    fn test_set_typing_false_clears_connection() {
        // テスト項目: typing=false で入力中一覧から消える
        // given (前提条件):
        let mut tracker = TypingTracker::new();
        let conn = ConnectionId::generate();
        tracker.set(conn, &room("general"), true);

        // when (操作):
        let changed = tracker.set(conn, &room("general"), false);

        // then (期待する結果):
        assert!(changed);
        assert!(tracker.typing_in(&room("general")).is_empty());
    }

    #[test]
    fn test_repeated_set_does_not_change_state() {
        // テスト項目: 同じ状態を二度設定しても変化なしと報告される
        // given (前提条件):
        let mut tracker = TypingTracker::new();
        let conn = ConnectionId::generate();
        tracker.set(conn, &room("general"), true);

        // when (操作):
        let changed = tracker.set(conn, &room("general"), true);

        // then (期待する結果):
        assert!(!changed);
        assert_eq!(tracker.typing_in(&room("general")).len(), 1);
    }

    #[test]
    fn test_typing_state_is_room_scoped() {
        // テスト項目: 入力中状態がルームごとに独立している
        // given (前提条件):
        let mut tracker = TypingTracker::new();
        let conn = ConnectionId::generate();
        tracker.set(conn, &room("general"), true);

        // when (操作):
        tracker.set(conn, &room("random"), false);

        // then (期待する結果):
        assert_eq!(tracker.typing_in(&room("general")), vec![conn]);
        assert!(tracker.typing_in(&room("random")).is_empty());
    }

    #[test]
    fn test_clear_connection_returns_rooms_where_typing() {
        // テスト項目: 切断時の一括クリアが入力中だったルームを返す
        // given (前提条件):
        let mut tracker = TypingTracker::new();
        let conn = ConnectionId::generate();
        let other = ConnectionId::generate();
        tracker.set(conn, &room("general"), true);
        tracker.set(conn, &room("random"), true);
        tracker.set(other, &room("general"), true);

        // when (操作):
        let cleared = tracker.clear_connection(&conn);

        // then (期待する結果):
        assert_eq!(cleared, vec![room("general"), room("random")]);
        assert_eq!(tracker.typing_in(&room("general")), vec![other]);
        assert!(tracker.typing_in(&room("random")).is_empty());
    }
}
