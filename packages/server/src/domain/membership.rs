//! Room Membership Table（ルームと接続の所属関係）
//!
//! room → 接続集合と connection → ルーム集合の両方向を保持し、
//! 常に相互逆像として維持する。空になったルームのエントリは落とす
//! （ルームディレクトリ自体は Persistence Port が保持する）。

use std::collections::{HashMap, HashSet};

use super::value_object::{ConnectionId, RoomName};

/// 所属関係の双方向テーブル
#[derive(Debug, Default)]
pub struct RoomMembershipTable {
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
    connections: HashMap<ConnectionId, HashSet<RoomName>>,
}

impl RoomMembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所属エッジを追加する。既に所属していれば false。
    pub fn join(&mut self, conn: ConnectionId, room: RoomName) -> bool {
        let inserted = self.rooms.entry(room.clone()).or_default().insert(conn);
        if inserted {
            self.connections.entry(conn).or_default().insert(room);
        }
        inserted
    }

    /// 所属エッジを削除する。所属していなければ false。
    pub fn leave(&mut self, conn: &ConnectionId, room: &RoomName) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(conn);
        if members.is_empty() {
            self.rooms.remove(room);
        }
        if removed {
            if let Some(rooms) = self.connections.get_mut(conn) {
                rooms.remove(room);
                if rooms.is_empty() {
                    self.connections.remove(conn);
                }
            }
        }
        removed
    }

    /// 接続を全ルームから外し、外れたルーム名を返す（ソート済み）。
    pub fn leave_all(&mut self, conn: &ConnectionId) -> Vec<RoomName> {
        let Some(rooms) = self.connections.remove(conn) else {
            return Vec::new();
        };
        let mut left: Vec<RoomName> = rooms.into_iter().collect();
        for room in &left {
            if let Some(members) = self.rooms.get_mut(room) {
                members.remove(conn);
                if members.is_empty() {
                    self.rooms.remove(room);
                }
            }
        }
        left.sort();
        left
    }

    /// ルームの現在のメンバー
    pub fn members(&self, room: &RoomName) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// 接続が所属しているルーム（ソート済み）
    pub fn rooms_of(&self, conn: &ConnectionId) -> Vec<RoomName> {
        let mut rooms: Vec<RoomName> = self
            .connections
            .get(conn)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// 所属判定
    pub fn is_member(&self, conn: &ConnectionId, room: &RoomName) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.contains(conn))
    }
}
