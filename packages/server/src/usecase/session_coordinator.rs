//! UseCase: セッション調停処理
//!
//! 接続のライフサイクルとルームのイベントを 1 か所で処理するコーディネーター。
//! プレゼンス・所属・入力中の 3 テーブルを排他的に所有し、全ての状態変更と
//! 配信順序をここで直列化する。
//!
//! ## 順序の保証
//!
//! 受付順序番号（seq）の採番と配信キューへの投入を同じロック区間で行うため、
//! 同一ルームのメッセージは全メンバーに受付順で届く。永続化はロックの外で
//! 行われ、履歴は seq 順で返るため、配信順と履歴順は常に一致する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SessionCoordinator の各公開操作
//! - 状態変更（3 テーブル）と配信（ブロードキャスト対象・イベント内容）の対応
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：非メンバー拒否、受付順配信、切断時の一括後片付け
//! - 永続化失敗時に配信が継続すること（縮退動作）を保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：user_join / join_room / メッセージ送信 / typing / 切断
//! - 異常系：検証エラー、非メンバー送信、ストア障害
//! - エッジケース：二重切断、切断済み接続からのイベント、同名の名乗り直し

use std::sync::Arc;

use tokio::sync::Mutex;

use idobata_shared::time::{Clock, SystemClock};

use crate::domain::{
    ChatMessage, ConnectionId, MessageBody, MessagePusher, MessageStore, PresenceRegistry,
    PusherChannel, RoomMembershipTable, RoomName, ServerEvent, Timestamp, TypingTracker, UserName,
};

use super::error::CoordinatorError;

/// join 時に送る履歴の最大件数
pub const ROOM_HISTORY_LIMIT: usize = 100;

/// 送信操作の受付結果
///
/// `persisted` が false のメッセージは配信済みだが履歴には残っていない。
/// 呼び出し側は非致命の警告として扱う。
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message: ChatMessage,
    pub persisted: bool,
}

/// コーディネーターが排他的に所有するインメモリテーブル
struct SessionTables {
    presence: PresenceRegistry,
    membership: RoomMembershipTable,
    typing: TypingTracker,
    /// 次に採番する受付順序番号
    next_seq: u64,
}

impl SessionTables {
    fn new() -> Self {
        Self {
            presence: PresenceRegistry::new(),
            membership: RoomMembershipTable::new(),
            typing: TypingTracker::new(),
            next_seq: 0,
        }
    }

    /// メッセージを受け付け、seq とタイムスタンプと送信者名を確定する
    fn accept_message(
        &mut self,
        conn: ConnectionId,
        body: MessageBody,
        room: Option<RoomName>,
        is_private: bool,
        now_millis: i64,
    ) -> ChatMessage {
        let seq = self.next_seq;
        self.next_seq += 1;
        let sender = self
            .presence
            .display_name(&conn)
            .cloned()
            .unwrap_or_else(UserName::anonymous);
        ChatMessage {
            seq,
            sender,
            sender_connection: conn,
            body,
            room,
            is_private,
            timestamp: Timestamp::new(now_millis),
        }
    }

    /// ルームで入力中の表示名一覧（Presence Registry 経由で解決、ソート済み）
    fn typing_display_names(&self, room: &RoomName) -> Vec<UserName> {
        let mut names: Vec<UserName> = self
            .typing
            .typing_in(room)
            .iter()
            .filter_map(|conn| self.presence.display_name(conn).cloned())
            .collect();
        names.sort();
        names
    }
}

/// Session Coordinator
///
/// すべての状態変更操作はテーブルロックの下で 1 ステップとして実行される。
/// ロックを Persistence Port の呼び出しにまたがって保持することはない。
pub struct SessionCoordinator {
    tables: Mutex<SessionTables>,
    /// Persistence Port（永続化の抽象化）
    store: Arc<dyn MessageStore>,
    /// MessagePusher（メッセージ送出の抽象化）
    pusher: Arc<dyn MessagePusher>,
    /// 受付時刻の採番
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    /// 新しい SessionCoordinator を作成
    pub fn new(store: Arc<dyn MessageStore>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self::with_clock(store, pusher, Arc::new(SystemClock))
    }

    /// テスト用に時計を差し替えて作成
    pub fn with_clock(
        store: Arc<dyn MessageStore>,
        pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tables: Mutex::new(SessionTables::new()),
            store,
            pusher,
            clock,
        }
    }

    /// 接続の受け入れ
    ///
    /// 新しい接続 ID を採番し、送出チャンネルと匿名プレゼンスを登録する。
    pub async fn on_connect(&self, sender: PusherChannel) -> ConnectionId {
        let conn = ConnectionId::generate();
        self.pusher.register(conn, sender).await;
        {
            let mut tables = self.tables.lock().await;
            tables.presence.register(conn);
        }
        tracing::info!("Connection '{}' registered", conn);
        conn
    }

    /// 利用者の参加（表示名の名乗り）
    ///
    /// 表示名が空なら InvalidInput。同名の名乗り直しは last-write-wins。
    /// 全接続へ user_list と user_joined を配信する。利用者レコードの
    /// 永続化失敗は配信を妨げない。
    pub async fn on_user_join(
        &self,
        conn: ConnectionId,
        display_name: &str,
    ) -> Result<(), CoordinatorError> {
        let name = UserName::new(display_name.to_string())?;

        {
            let mut tables = self.tables.lock().await;
            if !tables.presence.is_registered(&conn) {
                return Err(CoordinatorError::ConnectionClosed);
            }
            tables.presence.identify(conn, name.clone());

            let targets = tables.presence.connections();
            let user_list = ServerEvent::UserList {
                users: tables.presence.online_users(),
            };
            self.broadcast(targets.clone(), &user_list).await;
            let joined = ServerEvent::UserJoined {
                username: name.clone(),
                id: conn,
            };
            self.broadcast(targets, &joined).await;
        }

        // 永続化はブロードキャストの後。失敗はログのみ。
        if let Err(e) = self.store.upsert_user(&name, true).await {
            tracing::warn!("Failed to persist user '{}': {}", name, e);
        }
        tracing::info!("'{}' joined the chat ({})", name, conn);
        Ok(())
    }

    /// ルームへの参加
    ///
    /// ルームをディレクトリに登録し（失敗してもインメモリ動作に縮退）、
    /// 所属エッジを追加して、本人へ joined_room と履歴を、ルーム全体
    /// （本人を含む）へ room_user_joined を配信する。参加済みルームへの
    /// 再 join は履歴の再送のみ行う。
    pub async fn on_join_room(
        &self,
        conn: ConnectionId,
        room_name: &str,
    ) -> Result<(), CoordinatorError> {
        let room = RoomName::new(room_name.to_string())?;

        if let Err(e) = self.store.ensure_room(&room).await {
            tracing::warn!("Failed to persist room '{}': {}", room, e);
        }

        {
            let mut tables = self.tables.lock().await;
            if !tables.presence.is_registered(&conn) {
                return Err(CoordinatorError::ConnectionClosed);
            }
            let newly_joined = tables.membership.join(conn, room.clone());
            self.push_to(&conn, &ServerEvent::JoinedRoom { room: room.clone() })
                .await;
            if newly_joined {
                let username = tables
                    .presence
                    .display_name(&conn)
                    .cloned()
                    .unwrap_or_else(UserName::anonymous);
                let members = tables.membership.members(&room);
                self.broadcast(
                    members,
                    &ServerEvent::RoomUserJoined {
                        username,
                        room: room.clone(),
                    },
                )
                .await;
                tracing::info!("Connection '{}' joined room '{}'", conn, room);
            }
        }

        // 履歴の取得はロックの外で行う。join 完了後に受け付けられたメッセージは
        // ライブ配信と履歴の両方に現れ得る（at-least-once）。
        let messages = match self.store.history(&room, ROOM_HISTORY_LIMIT).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Failed to load history for room '{}': {}", room, e);
                Vec::new()
            }
        };
        self.push_to(&conn, &ServerEvent::RoomMessages { room, messages })
            .await;
        Ok(())
    }

    /// ルームからの退出
    ///
    /// 所属エッジを外し（未所属なら no-op）、(conn, room) の入力中状態を
    /// 消して、残りのメンバーへ room_user_left を配信する。退出者が
    /// 入力中だった場合は typing_users も更新する。
    pub async fn on_leave_room(
        &self,
        conn: ConnectionId,
        room_name: &str,
    ) -> Result<(), CoordinatorError> {
        let room = RoomName::new(room_name.to_string())?;

        let mut tables = self.tables.lock().await;
        if !tables.presence.is_registered(&conn) {
            return Err(CoordinatorError::ConnectionClosed);
        }
        if !tables.membership.leave(&conn, &room) {
            return Ok(());
        }
        let was_typing = tables.typing.clear_room(&conn, &room);
        let username = tables
            .presence
            .display_name(&conn)
            .cloned()
            .unwrap_or_else(UserName::anonymous);
        let remaining = tables.membership.members(&room);
        self.broadcast(
            remaining.clone(),
            &ServerEvent::RoomUserLeft {
                username,
                room: room.clone(),
            },
        )
        .await;
        if was_typing {
            let users = tables.typing_display_names(&room);
            self.broadcast(remaining, &ServerEvent::TypingUsers { room: room.clone(), users })
                .await;
        }
        tracing::info!("Connection '{}' left room '{}'", conn, room);
        Ok(())
    }

    /// グローバルメッセージの送信（全接続へのブロードキャスト）
    pub async fn on_send_message(
        &self,
        conn: ConnectionId,
        body: &str,
    ) -> Result<SendReceipt, CoordinatorError> {
        let body = MessageBody::new(body.to_string())?;

        let message = {
            let mut tables = self.tables.lock().await;
            if !tables.presence.is_registered(&conn) {
                return Err(CoordinatorError::ConnectionClosed);
            }
            let message =
                tables.accept_message(conn, body, None, false, self.clock.now_millis());
            let targets = tables.presence.connections();
            self.broadcast(
                targets,
                &ServerEvent::ReceiveMessage {
                    message: message.clone(),
                },
            )
            .await;
            message
        };

        let persisted = self.persist(message.clone()).await;
        Ok(SendReceipt { message, persisted })
    }

    /// ルームメッセージの送信
    ///
    /// 非メンバーからの送信は NotAMember で拒否し、配信も永続化も行わない。
    /// 受付順序番号の採番と配信をロック下で行い、永続化はロックの外で
    /// 待ち合わせる。永続化の失敗は受付結果の `persisted` で報告される。
    pub async fn on_send_room_message(
        &self,
        conn: ConnectionId,
        room_name: &str,
        body: &str,
    ) -> Result<SendReceipt, CoordinatorError> {
        let room = RoomName::new(room_name.to_string())?;
        let body = MessageBody::new(body.to_string())?;

        let message = {
            let mut tables = self.tables.lock().await;
            if !tables.presence.is_registered(&conn) {
                return Err(CoordinatorError::ConnectionClosed);
            }
            if !tables.membership.is_member(&conn, &room) {
                return Err(CoordinatorError::NotAMember {
                    room: room.into_string(),
                });
            }
            let message = tables.accept_message(
                conn,
                body,
                Some(room.clone()),
                false,
                self.clock.now_millis(),
            );
            let members = tables.membership.members(&room);
            self.broadcast(
                members,
                &ServerEvent::ReceiveRoomMessage {
                    message: message.clone(),
                },
            )
            .await;
            message
        };

        let persisted = self.persist(message.clone()).await;
        Ok(SendReceipt { message, persisted })
    }

    /// プライベートメッセージの送信
    ///
    /// 本人へエコーし、宛先が生きている場合のみ配信する。宛先が既に
    /// 切断されていても送信者にはエラーを返さない（fire-and-forget）。
    pub async fn on_private_message(
        &self,
        conn: ConnectionId,
        to: ConnectionId,
        body: &str,
    ) -> Result<SendReceipt, CoordinatorError> {
        let body = MessageBody::new(body.to_string())?;

        let message = {
            let mut tables = self.tables.lock().await;
            if !tables.presence.is_registered(&conn) {
                return Err(CoordinatorError::ConnectionClosed);
            }
            let message = tables.accept_message(conn, body, None, true, self.clock.now_millis());
            let event = ServerEvent::PrivateMessage {
                message: message.clone(),
            };
            self.push_to(&conn, &event).await;
            if tables.presence.is_registered(&to) {
                self.push_to(&to, &event).await;
            } else {
                tracing::debug!("Private message target '{}' is not live, skipping", to);
            }
            message
        };

        let persisted = self.persist(message.clone()).await;
        Ok(SendReceipt { message, persisted })
    }

    /// 入力中状態の更新
    ///
    /// ルームのメンバーでない接続からのイベントは、遅延して届いた
    /// 稼働外イベントとして黙って無視する（エラーではない）。
    pub async fn on_typing(
        &self,
        conn: ConnectionId,
        room_name: &str,
        is_typing: bool,
    ) -> Result<(), CoordinatorError> {
        let room = RoomName::new(room_name.to_string())?;

        let mut tables = self.tables.lock().await;
        if !tables.presence.is_registered(&conn) {
            return Err(CoordinatorError::ConnectionClosed);
        }
        if !tables.membership.is_member(&conn, &room) {
            tracing::debug!(
                "Typing event from '{}' for room '{}' without membership, ignoring",
                conn,
                room
            );
            return Ok(());
        }
        tables.typing.set(conn, &room, is_typing);
        let users = tables.typing_display_names(&room);
        let members = tables.membership.members(&room);
        self.broadcast(members, &ServerEvent::TypingUsers { room, users })
            .await;
        Ok(())
    }

    /// 切断の一括後片付け
    ///
    /// 所属していた全ルームからの退出通知、入力中状態の消去、利用者の
    /// オフライン遷移、オンライン一覧の再配信までを 1 遷移として行う。
    /// 既に片付いた接続への二重シグナルは no-op。永続化が失敗しても
    /// 後片付け自体は必ず完了する。
    pub async fn on_disconnect(&self, conn: ConnectionId) {
        let offline_user = {
            let mut tables = self.tables.lock().await;
            if !tables.presence.is_registered(&conn) {
                tracing::debug!("Disconnect for unknown connection '{}', ignoring", conn);
                return;
            }
            let username = tables
                .presence
                .display_name(&conn)
                .cloned()
                .unwrap_or_else(UserName::anonymous);

            let typing_rooms = tables.typing.clear_connection(&conn);
            let rooms = tables.membership.leave_all(&conn);
            for room in rooms {
                let remaining = tables.membership.members(&room);
                self.broadcast(
                    remaining.clone(),
                    &ServerEvent::RoomUserLeft {
                        username: username.clone(),
                        room: room.clone(),
                    },
                )
                .await;
                if typing_rooms.contains(&room) {
                    let users = tables.typing_display_names(&room);
                    self.broadcast(remaining, &ServerEvent::TypingUsers { room, users })
                        .await;
                }
            }

            let offline_user = tables.presence.remove(&conn);
            let targets = tables.presence.connections();
            if let Some(name) = &offline_user {
                self.broadcast(
                    targets.clone(),
                    &ServerEvent::UserLeft {
                        username: name.clone(),
                        id: conn,
                    },
                )
                .await;
            }
            self.broadcast(
                targets,
                &ServerEvent::UserList {
                    users: tables.presence.online_users(),
                },
            )
            .await;
            offline_user
        };

        self.pusher.unregister(&conn).await;

        // 後片付けは完了している。オフライン状態の永続化失敗はログのみ。
        if let Some(name) = offline_user {
            if let Err(e) = self.store.upsert_user(&name, false).await {
                tracing::warn!("Failed to persist offline state for '{}': {}", name, e);
            }
            tracing::info!("'{}' left the chat", name);
        }
        tracing::info!("Connection '{}' disconnected and reconciled", conn);
    }

    /// 宛先集合へイベントを配信する（部分失敗はログのみ）
    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.pusher.broadcast(targets, &event.to_json()).await {
            tracing::warn!("Broadcast failed: {}", e);
        }
    }

    /// 1 接続へイベントを送る（失敗はログのみ）
    async fn push_to(&self, conn: &ConnectionId, event: &ServerEvent) {
        if let Err(e) = self.pusher.push_to(conn, &event.to_json()).await {
            tracing::warn!("Failed to push event to '{}': {}", conn, e);
        }
    }

    /// ブロードキャスト後の永続化。失敗は履歴からの欠落として扱い、ログに残す。
    async fn persist(&self, message: ChatMessage) -> bool {
        match self.store.save(message).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to persist message: {}", e);
                false
            }
        }
    }
}
