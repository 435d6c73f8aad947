//! Presence Registry（接続 ↔ 利用者の対応表）
//!
//! 接続 ID と表示名の対応、およびオンライン状態の唯一の情報源。
//! typing を含むすべての接続 → 表示名の解決はこのレジストリを経由する。
//!
//! 同じ表示名を複数の接続が名乗った場合は last-write-wins:
//! 最後に名乗った接続がその名前のプレゼンスを代表する。

use std::collections::HashMap;

use super::value_object::{ConnectionId, UserName};

/// 表示名ごとのプレゼンス情報
#[derive(Debug, Clone)]
struct UserPresence {
    online: bool,
    /// この名前を最後に名乗った接続
    connection: ConnectionId,
}

/// 接続と利用者のプレゼンステーブル
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    /// 接続 ID → 表示名（user_join 前の接続は None）
    connections: HashMap<ConnectionId, Option<UserName>>,
    /// 表示名 → プレゼンス情報（レコードは切断後も残る）
    users: HashMap<UserName, UserPresence>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しい接続を匿名状態で登録する
    pub fn register(&mut self, conn: ConnectionId) {
        self.connections.insert(conn, None);
    }

    /// 接続が登録済み（未切断）かどうか
    pub fn is_registered(&self, conn: &ConnectionId) -> bool {
        self.connections.contains_key(conn)
    }

    /// 接続に表示名を関連付け、オンラインにする（同名は last-write-wins）
    pub fn identify(&mut self, conn: ConnectionId, name: UserName) {
        self.connections.insert(conn, Some(name.clone()));
        self.users.insert(
            name,
            UserPresence {
                online: true,
                connection: conn,
            },
        );
    }

    /// 接続に関連付いた表示名を返す（未認識なら None）
    pub fn display_name(&self, conn: &ConnectionId) -> Option<&UserName> {
        self.connections.get(conn).and_then(|name| name.as_ref())
    }

    /// 接続を削除する
    ///
    /// その接続がまだ名前の最後の名乗り手であった場合のみ、利用者を
    /// オフラインへ遷移させてその表示名を返す。別の接続が同じ名前を
    /// 名乗り直していた場合や匿名のままだった場合は None。
    /// 登録されていない接続に対しては no-op。
    pub fn remove(&mut self, conn: &ConnectionId) -> Option<UserName> {
        let name = self.connections.remove(conn).flatten()?;
        let presence = self.users.get_mut(&name)?;
        if presence.connection != *conn {
            return None;
        }
        presence.online = false;
        Some(name)
    }

    /// オンラインの表示名一覧（表示順を安定させるためソート済み）
    pub fn online_users(&self) -> Vec<UserName> {
        let mut names: Vec<UserName> = self
            .users
            .iter()
            .filter(|(_, presence)| presence.online)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// 登録中の全接続 ID
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }
}
