//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 接続へのメッセージ送出（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送出に
//! 使用します。これにより「WebSocket の生成」と「メッセージの送出」が
//! 分離されます：
//!
//! - UI 層: WebSocket 接続の受付、sender の生成
//! - Infrastructure 層: sender の管理、メッセージ送出
//!
//! 送出はチャンネルへの enqueue であり、実際のネットワーク書き込みは
//! 接続ごとのタスクが独立して行う。遅い接続が他の接続を妨げることはない。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中の接続 ID と対応する送出チャンネルのマップ
    channels: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(channels: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register(&self, conn: ConnectionId, sender: PusherChannel) {
        let mut channels = self.channels.lock().await;
        channels.insert(conn, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", conn);
    }

    async fn unregister(&self, conn: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        channels.remove(conn);
        tracing::debug!("Connection '{}' unregistered from MessagePusher", conn);
    }

    async fn push_to(&self, conn: &ConnectionId, content: &str) -> Result<(), MessagePushError> {
        let channels = self.channels.lock().await;

        if let Some(sender) = channels.get(conn) {
            sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed message to connection '{}'", conn);
            Ok(())
        } else {
            Err(MessagePushError::ConnectionNotFound(conn.to_string()))
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let channels = self.channels.lock().await;

        for target in targets {
            if let Some(sender) = channels.get(&target) {
                // ブロードキャストでは一部の送出失敗を許容
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                } else {
                    tracing::debug!("Broadcasted message to connection '{}'", target);
                }
            } else {
                tracing::warn!(
                    "Connection '{}' not found during broadcast, skipping",
                    target
                );
            }
        }

        Ok(())
    }
}
