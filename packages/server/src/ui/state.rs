//! Server state and connection management.

use std::sync::Arc;

use crate::{domain::MessageStore, usecase::SessionCoordinator};

/// Shared application state
pub struct AppState {
    /// SessionCoordinator（セッション調停のユースケース）
    pub coordinator: Arc<SessionCoordinator>,
    /// Persistence Port（HTTP のクエリサーフェスが直接参照する）
    pub store: Arc<dyn MessageStore>,
}
