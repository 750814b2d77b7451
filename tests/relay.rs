mod common;

use heartlink::{
    matches::{ledger, Decision},
    rooms::{dispatch, handle_frame, room_key, ChatMessage, ClientEvent, JoinRoom, Relay, ServerEvent, Typing},
    AppError,
};
use tokio::sync::mpsc::error::TryRecvError;
use uuid::Uuid;

async fn matched(db_pool: &sqlx::SqlitePool, a: Uuid, b: Uuid) {
    let request = ledger::propose(db_pool, a, b).await.unwrap();
    ledger::respond(db_pool, request.id, b, Decision::Accepted).await.unwrap();
}

#[tokio::test]
async fn joining_requires_identity_and_a_match() {
    let db_pool = common::pool().await;
    let relay = Relay::new();
    let a = common::user(&db_pool, "Ana", "", &[]).await.id;
    let b = common::user(&db_pool, "Ben", "", &[]).await.id;
    let (conn, mut rx) = relay.connect(a);

    let impersonation = ClientEvent::JoinRoom(JoinRoom { user_id: b, match_id: a });
    assert!(matches!(dispatch(&db_pool, &relay, conn, a, impersonation).await, Err(AppError::Forbidden(_))));

    let unmatched = ClientEvent::JoinRoom(JoinRoom { user_id: a, match_id: b });
    assert!(matches!(dispatch(&db_pool, &relay, conn, a, unmatched.clone()).await, Err(AppError::Forbidden(_))));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    matched(&db_pool, a, b).await;
    dispatch(&db_pool, &relay, conn, a, unmatched).await.unwrap();

    let room = room_key(&a.to_string(), &b.to_string());
    assert_eq!(rx.try_recv().unwrap(), ServerEvent::Joined { room: room.clone() });
    assert_eq!(relay.room_size(&room), 1);
}

#[tokio::test]
async fn chat_reaches_both_members_only() {
    let db_pool = common::pool().await;
    let relay = Relay::new();
    let a = common::user(&db_pool, "Ana", "", &[]).await.id;
    let b = common::user(&db_pool, "Ben", "", &[]).await.id;
    let c = common::user(&db_pool, "Cy", "", &[]).await.id;
    let d = common::user(&db_pool, "Dee", "", &[]).await.id;
    matched(&db_pool, a, b).await;
    matched(&db_pool, c, d).await;

    let (conn_a, mut rx_a) = relay.connect(a);
    let (conn_b, mut rx_b) = relay.connect(b);
    let (conn_c, mut rx_c) = relay.connect(c);
    dispatch(&db_pool, &relay, conn_a, a, ClientEvent::JoinRoom(JoinRoom { user_id: a, match_id: b })).await.unwrap();
    dispatch(&db_pool, &relay, conn_b, b, ClientEvent::JoinRoom(JoinRoom { user_id: b, match_id: a })).await.unwrap();
    dispatch(&db_pool, &relay, conn_c, c, ClientEvent::JoinRoom(JoinRoom { user_id: c, match_id: d })).await.unwrap();
    for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
        assert!(matches!(rx.try_recv(), Ok(ServerEvent::Joined { .. })));
    }

    let msg = ChatMessage { sender_id: a, receiver_id: b, message: None, encrypted_message: "c0ffee".to_owned() };
    dispatch(&db_pool, &relay, conn_a, a, ClientEvent::ChatMessage(msg.clone())).await.unwrap();

    assert_eq!(rx_a.try_recv().unwrap(), ServerEvent::Message(msg.clone()));
    assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::Message(msg));
    assert_eq!(rx_c.try_recv(), Err(TryRecvError::Empty));

    dispatch(&db_pool, &relay, conn_a, a, ClientEvent::Typing(Typing { sender_id: a, receiver_id: b })).await.unwrap();
    assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::Typing { sender_id: a });
    assert_eq!(rx_a.try_recv(), Err(TryRecvError::Empty));

    // c is matched, just not with b
    let intrusion = ChatMessage { sender_id: c, receiver_id: b, message: None, encrypted_message: "00".to_owned() };
    assert!(matches!(
        dispatch(&db_pool, &relay, conn_c, c, ClientEvent::ChatMessage(intrusion)).await,
        Err(AppError::Forbidden(_))
    ));
    assert_eq!(rx_b.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn bad_frames_get_one_error_and_the_socket_keeps_working() {
    let db_pool = common::pool().await;
    let relay = Relay::new();
    let a = common::user(&db_pool, "Ana", "", &[]).await.id;
    let b = common::user(&db_pool, "Ben", "", &[]).await.id;
    let c = common::user(&db_pool, "Cy", "", &[]).await.id;
    matched(&db_pool, a, b).await;
    let (conn, mut rx) = relay.connect(a);

    handle_frame(&db_pool, &relay, conn, a, "{not json").await;
    assert!(matches!(rx.try_recv(), Ok(ServerEvent::Error { .. })));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    let forbidden = serde_json::json!({
        "event": "chatMessage",
        "data": { "senderId": a, "receiverId": c, "encryptedMessage": "00" }
    });
    handle_frame(&db_pool, &relay, conn, a, &forbidden.to_string()).await;
    assert!(matches!(rx.try_recv(), Ok(ServerEvent::Error { .. })));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    let join = serde_json::json!({ "event": "joinRoom", "data": { "userId": a, "matchId": b } });
    handle_frame(&db_pool, &relay, conn, a, &join.to_string()).await;
    let chat = serde_json::json!({
        "event": "chatMessage",
        "data": { "senderId": a, "receiverId": b, "encryptedMessage": "beef" }
    });
    handle_frame(&db_pool, &relay, conn, a, &chat.to_string()).await;

    assert!(matches!(rx.try_recv(), Ok(ServerEvent::Joined { .. })));
    assert!(matches!(rx.try_recv(), Ok(ServerEvent::Message(msg)) if msg.encrypted_message == "beef"));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}
