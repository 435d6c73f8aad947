//! Broadcast Fan-out の定義（メッセージ送出の抽象化）
//!
//! コーディネーターが選定した宛先集合への配信を担う。配信は接続ごとに
//! 独立しており、遅い・死んだ接続が他の接続への配信を妨げることはない。
//! 失敗した配信は破棄される（best effort）。死んだ接続の回収は
//! トランスポート層の close シグナル経由の切断処理が行う。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// 接続ごとの送出チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Message Pusher trait（Broadcast Fan-out ポート）
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送出チャンネルを登録する
    async fn register(&self, conn: ConnectionId, sender: PusherChannel);

    /// 接続の送出チャンネルを解除する
    async fn unregister(&self, conn: &ConnectionId);

    /// 1 接続へ送信する
    async fn push_to(&self, conn: &ConnectionId, content: &str) -> Result<(), MessagePushError>;

    /// 宛先集合へ送信する（接続ごとに独立、部分失敗を許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
