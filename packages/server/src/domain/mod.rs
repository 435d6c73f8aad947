//! ドメイン層
//!
//! 値オブジェクト、エンティティ、コーディネーターが所有する状態テーブル、
//! および外部ポート（Persistence Port / Broadcast Fan-out）の trait を定義します。

pub mod entity;
pub mod error;
pub mod event;
pub mod membership;
pub mod presence;
pub mod pusher;
pub mod store;
pub mod typing;
pub mod value_object;

pub use entity::{ChatMessage, PersistedMessage, Room, User};
pub use error::{MessagePushError, StoreError, ValidationError};
pub use event::ServerEvent;
pub use membership::RoomMembershipTable;
pub use presence::PresenceRegistry;
pub use pusher::{MessagePusher, PusherChannel};
pub use store::MessageStore;
pub use typing::TypingTracker;
pub use value_object::{ConnectionId, MessageBody, MessageId, RoomName, Timestamp, UserName};
