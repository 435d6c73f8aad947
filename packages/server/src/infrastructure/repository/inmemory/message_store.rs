//! InMemory Message Store 実装
//!
//! ドメイン層が定義する MessageStore trait（Persistence Port）の具体的な実装。
//! 追記専用のメッセージログ、ルームディレクトリ、利用者レコードを
//! インメモリに保持します。
//!
//! ## 技術的負債
//!
//! 現在、ドメインモデルを直接ストレージとして使用しています。これは
//! InMemory 実装では許容される妥協ですが、将来 PostgreSQL などの DBMS を
//! 実装する際は、以下の変換層が必要になります：
//!
//! ```text
//! DB Row/JSON → MessageData (DTO) → PersistedMessage (ドメインモデル)
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use idobata_shared::time::get_unix_timestamp;

use crate::domain::{
    ChatMessage, MessageId, MessageStore, PersistedMessage, Room, RoomName, StoreError, Timestamp,
    User, UserName,
};

/// インメモリのストレージ本体
#[derive(Debug, Default)]
struct StoreInner {
    /// 受付順序番号（seq）順に保たれるメッセージログ
    messages: Vec<PersistedMessage>,
    /// ルームディレクトリ（作成後は削除されない）
    rooms: BTreeMap<RoomName, Room>,
    /// 利用者レコード（切断後も残る）
    users: BTreeMap<UserName, User>,
}

/// インメモリ Message Store 実装
pub struct InMemoryMessageStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryMessageStore {
    /// 新しい InMemoryMessageStore を作成
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save(&self, message: ChatMessage) -> Result<PersistedMessage, StoreError> {
        let persisted = PersistedMessage {
            id: MessageId::generate(),
            message,
        };
        let mut inner = self.inner.lock().await;
        // save の完了順によらずログを seq 順に保つ
        let pos = inner
            .messages
            .partition_point(|m| m.message.seq <= persisted.message.seq);
        inner.messages.insert(pos, persisted.clone());
        Ok(persisted)
    }

    async fn history(
        &self,
        room: &RoomName,
        limit: usize,
    ) -> Result<Vec<PersistedMessage>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.message.room.as_ref() == Some(room))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PersistedMessage>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .messages
            .iter()
            .filter(|m| !m.message.is_private)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.rooms.values().cloned().collect())
    }

    async fn ensure_room(&self, name: &RoomName) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        // ロック下の find-or-create なので同時初回 join でも重複しない
        inner.rooms.entry(name.clone()).or_insert_with(|| Room {
            name: name.clone(),
            created_at: Timestamp::new(get_unix_timestamp()),
        });
        Ok(())
    }

    async fn upsert_user(&self, name: &UserName, online: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.users.insert(
            name.clone(),
            User {
                name: name.clone(),
                online,
            },
        );
        Ok(())
    }

    async fn online_users(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .filter(|user| user.online)
            .cloned()
            .collect())
    }
}
