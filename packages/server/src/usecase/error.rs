//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::ValidationError;

/// Session Coordinator の操作エラー
///
/// どのエラーも該当する 1 操作だけを拒否する。コーディネーター本体や
/// 他の接続の状態・配信には影響しない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// 入力の検証に失敗した（状態は変化しない）
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// 参加していないルームへの送信（状態は変化せず、配信も永続化も行われない）
    #[error("connection is not a member of room '{room}'")]
    NotAMember { room: String },

    /// 既に閉じられた接続からのイベント（呼び出し側はログに残して破棄する）
    #[error("connection is closed")]
    ConnectionClosed,
}
