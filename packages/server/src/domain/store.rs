//! Persistence Port の定義
//!
//! コーディネーターが必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 失敗の扱い
//!
//! どの操作の失敗もコーディネーターにとって致命的ではない。呼び出し側は
//! ログに残した上で、該当操作をインメモリのみの動作に縮退させる。

use async_trait::async_trait;

use super::{
    entity::{ChatMessage, PersistedMessage, Room, User},
    error::StoreError,
    value_object::{RoomName, UserName},
};

/// Message Store trait（Persistence Port）
///
/// メッセージの追記専用ログ、ルームディレクトリ、利用者レコードを担う。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// メッセージを 1 件追記する
    ///
    /// 追記はメッセージ単位でアトミックであり、部分書き込みが
    /// `history` から観測されることはない。
    async fn save(&self, message: ChatMessage) -> Result<PersistedMessage, StoreError>;

    /// ルームの履歴を受付順（古い順）で先頭から最大 `limit` 件返す
    ///
    /// 返される列は、そのルームの永続化済み系列の prefix になる。
    async fn history(&self, room: &RoomName, limit: usize)
    -> Result<Vec<PersistedMessage>, StoreError>;

    /// 全スコープの非プライベートメッセージを受付順で先頭から最大 `limit` 件返す
    async fn recent(&self, limit: usize) -> Result<Vec<PersistedMessage>, StoreError>;

    /// ルームディレクトリの一覧
    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError>;

    /// ルームを作成する（既存なら no-op）
    ///
    /// 同じルームへの同時初回 join でもエントリが重複しないこと。
    async fn ensure_room(&self, name: &RoomName) -> Result<(), StoreError>;

    /// 利用者レコードを upsert する
    async fn upsert_user(&self, name: &UserName, online: bool) -> Result<(), StoreError>;

    /// オンラインの利用者一覧
    async fn online_users(&self) -> Result<Vec<User>, StoreError>;
}
