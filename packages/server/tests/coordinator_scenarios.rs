//! Integration tests driving the wired coordination core
//! (SessionCoordinator + InMemoryMessageStore + WebSocketMessagePusher).

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, mpsc};

use idobata_server::{
    domain::{
        ConnectionId, MessageStore, RoomName, ServerEvent, UserName,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryMessageStore,
    },
    usecase::{ROOM_HISTORY_LIMIT, SessionCoordinator},
};

struct TestHarness {
    coordinator: SessionCoordinator,
    store: Arc<InMemoryMessageStore>,
}

impl TestHarness {
    fn new() -> Self {
        let store = Arc::new(InMemoryMessageStore::new());
        let pusher = Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
            HashMap::new(),
        ))));
        let coordinator = SessionCoordinator::new(store.clone(), pusher);
        Self { coordinator, store }
    }

    async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = self.coordinator.on_connect(tx).await;
        (conn, rx)
    }
}

/// 受信済みイベントを全て読み出す
fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(json) = rx.try_recv() {
        events.push(serde_json::from_str(&json).expect("server event should parse"));
    }
    events
}

fn name(value: &str) -> UserName {
    UserName::new(value.to_string()).unwrap()
}

fn room(value: &str) -> RoomName {
    RoomName::new(value.to_string()).unwrap()
}

#[tokio::test]
async fn test_room_lifecycle_scenario() {
    // テスト項目: ルームの作成・参加・送信・後続参加者への履歴配信までの
    //             一連のシナリオ
    // given (前提条件):
    let harness = TestHarness::new();
    let (c1, mut c1_rx) = harness.connect().await;
    let (c2, mut c2_rx) = harness.connect().await;
    harness.coordinator.on_user_join(c1, "alice").await.unwrap();
    harness.coordinator.on_user_join(c2, "bob").await.unwrap();
    drain(&mut c1_rx);
    drain(&mut c2_rx);

    // when (操作): C1 が存在しないルーム general に参加する
    harness.coordinator.on_join_room(c1, "general").await.unwrap();

    // then (期待する結果): ルームが作成され、joined_room と空の履歴が届く
    let rooms = harness.store.list_rooms().await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].name, room("general"));
    let events = drain(&mut c1_rx);
    assert_eq!(
        events,
        vec![
            ServerEvent::JoinedRoom {
                room: room("general")
            },
            ServerEvent::RoomUserJoined {
                username: name("alice"),
                room: room("general")
            },
            ServerEvent::RoomMessages {
                room: room("general"),
                messages: vec![]
            },
        ]
    );

    // when (操作): C1 が "hi" を送信する（唯一のメンバー）
    let receipt = harness
        .coordinator
        .on_send_room_message(c1, "general", "hi")
        .await
        .unwrap();

    // then (期待する結果): 送信者名で永続化され、C1 だけに配信される
    assert!(receipt.persisted);
    assert_eq!(receipt.message.sender, name("alice"));
    let events = drain(&mut c1_rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ServerEvent::ReceiveRoomMessage { .. }));
    assert!(drain(&mut c2_rx).is_empty());

    // when (操作): C2 が general に参加する
    harness.coordinator.on_join_room(c2, "general").await.unwrap();

    // then (期待する結果): C2 の履歴に "hi" が含まれ、C1 に room_user_joined が届く
    let c2_events = drain(&mut c2_rx);
    let history = c2_events
        .iter()
        .find_map(|event| match event {
            ServerEvent::RoomMessages { messages, .. } => Some(messages),
            _ => None,
        })
        .expect("room_messages should arrive");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message.body.as_str(), "hi");
    assert_eq!(history[0].message.sender, name("alice"));

    let c1_events = drain(&mut c1_rx);
    assert_eq!(
        c1_events,
        vec![ServerEvent::RoomUserJoined {
            username: name("bob"),
            room: room("general")
        }]
    );
}

#[tokio::test]
async fn test_typing_indicator_scenario() {
    // テスト項目: typing_users がメンバーに配信され、退出で消えるシナリオ
    // given (前提条件):
    let harness = TestHarness::new();
    let (c1, mut c1_rx) = harness.connect().await;
    let (c2, mut c2_rx) = harness.connect().await;
    harness.coordinator.on_user_join(c1, "alice").await.unwrap();
    harness.coordinator.on_user_join(c2, "bob").await.unwrap();
    harness.coordinator.on_join_room(c1, "general").await.unwrap();
    harness.coordinator.on_join_room(c2, "general").await.unwrap();
    drain(&mut c1_rx);
    drain(&mut c2_rx);

    // when (操作): C1 が入力を始める
    harness.coordinator.on_typing(c1, "general", true).await.unwrap();

    // then (期待する結果): メンバーへの typing_users に alice が含まれる
    let events = drain(&mut c2_rx);
    assert_eq!(
        events,
        vec![ServerEvent::TypingUsers {
            room: room("general"),
            users: vec![name("alice")]
        }]
    );

    // when (操作): C1 が入力中のままルームを退出する
    harness.coordinator.on_leave_room(c1, "general").await.unwrap();

    // then (期待する結果): 残りのメンバーの typing_users から alice が消える
    let events = drain(&mut c2_rx);
    assert_eq!(
        events,
        vec![
            ServerEvent::RoomUserLeft {
                username: name("alice"),
                room: room("general")
            },
            ServerEvent::TypingUsers {
                room: room("general"),
                users: vec![]
            },
        ]
    );
}

#[tokio::test]
async fn test_private_message_to_disconnected_target_scenario() {
    // テスト項目: 切断済みの宛先へのプライベートメッセージのシナリオ
    // given (前提条件):
    let harness = TestHarness::new();
    let (c1, mut c1_rx) = harness.connect().await;
    let (c2, _c2_rx) = harness.connect().await;
    harness.coordinator.on_user_join(c1, "alice").await.unwrap();
    harness.coordinator.on_user_join(c2, "bob").await.unwrap();
    harness.coordinator.on_disconnect(c2).await;
    drain(&mut c1_rx);

    // when (操作): C1 が切断済みの C2 へ送信する
    let receipt = harness
        .coordinator
        .on_private_message(c1, c2, "psst")
        .await
        .unwrap();

    // then (期待する結果): エラーにならず、本人へのエコーと永続化が行われる
    assert!(receipt.persisted);
    assert!(receipt.message.is_private);
    let events = drain(&mut c1_rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ServerEvent::PrivateMessage { .. }));

    // プライベートメッセージはクエリサーフェスの recent に現れない
    let recent = harness.store.recent(100).await.unwrap();
    assert!(recent.is_empty());
}

#[tokio::test]
async fn test_history_is_bounded_prefix_of_persisted_sequence() {
    // テスト項目: join 時の履歴が最大 100 件、受付順（古い順）の prefix になる
    // given (前提条件):
    let harness = TestHarness::new();
    let (c1, mut c1_rx) = harness.connect().await;
    harness.coordinator.on_user_join(c1, "alice").await.unwrap();
    harness.coordinator.on_join_room(c1, "general").await.unwrap();
    for i in 0..(ROOM_HISTORY_LIMIT + 20) {
        harness
            .coordinator
            .on_send_room_message(c1, "general", &format!("message {}", i))
            .await
            .unwrap();
    }
    drain(&mut c1_rx);

    // when (操作): 新しい接続が general に参加する
    let (c2, mut c2_rx) = harness.connect().await;
    harness.coordinator.on_join_room(c2, "general").await.unwrap();

    // then (期待する結果):
    let events = drain(&mut c2_rx);
    let history = events
        .iter()
        .find_map(|event| match event {
            ServerEvent::RoomMessages { messages, .. } => Some(messages),
            _ => None,
        })
        .expect("room_messages should arrive");
    assert_eq!(history.len(), ROOM_HISTORY_LIMIT);
    // 受付順の prefix であること（seq が単調増加し、先頭から始まる）
    let seqs: Vec<u64> = history.iter().map(|m| m.message.seq).collect();
    let full_history = harness
        .store
        .history(&room("general"), usize::MAX)
        .await
        .unwrap();
    let full_seqs: Vec<u64> = full_history.iter().map(|m| m.message.seq).collect();
    assert_eq!(seqs[..], full_seqs[..ROOM_HISTORY_LIMIT]);
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn test_disconnect_reconciles_every_room() {
    // テスト項目: 切断で複数ルームの全てから退出通知が届き、二重切断が無害で
    //             あること
    // given (前提条件):
    let harness = TestHarness::new();
    let (c1, mut c1_rx) = harness.connect().await;
    let (c2, mut c2_rx) = harness.connect().await;
    harness.coordinator.on_user_join(c1, "alice").await.unwrap();
    harness.coordinator.on_user_join(c2, "bob").await.unwrap();
    for room_name in ["general", "random"] {
        harness.coordinator.on_join_room(c1, room_name).await.unwrap();
        harness.coordinator.on_join_room(c2, room_name).await.unwrap();
    }
    drain(&mut c1_rx);
    drain(&mut c2_rx);

    // when (操作):
    harness.coordinator.on_disconnect(c1).await;
    harness.coordinator.on_disconnect(c1).await;

    // then (期待する結果): 各ルームの退出通知と user_left / user_list が一度だけ届く
    let events = drain(&mut c2_rx);
    let left_rooms: Vec<&RoomName> = events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::RoomUserLeft { room, .. } => Some(room),
            _ => None,
        })
        .collect();
    assert_eq!(left_rooms, vec![&room("general"), &room("random")]);
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, ServerEvent::UserLeft { .. }))
            .count(),
        1
    );
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, ServerEvent::UserList { .. }))
            .count(),
        1
    );

    // オフライン状態が永続化されている
    let online = harness.store.online_users().await.unwrap();
    assert_eq!(online.len(), 1);
    assert_eq!(online[0].name, name("bob"));
}
