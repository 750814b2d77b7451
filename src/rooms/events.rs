//! Socket frames. Every frame is `{"event": <name>, "data": {...}}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinRoom(JoinRoom),
    ChatMessage(ChatMessage),
    Typing(Typing),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub user_id: Uuid,
    /// The partner's user id.
    pub match_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub encrypted_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typing {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Joined { room: String },
    Message(ChatMessage),
    #[serde(rename_all = "camelCase")]
    Typing { sender_id: Uuid },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_chat_message_without_plaintext() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let frame = json!({
            "event": "chatMessage",
            "data": { "senderId": a, "receiverId": b, "encryptedMessage": "beef" }
        });

        let ClientEvent::ChatMessage(msg) = serde_json::from_value(frame).unwrap() else {
            panic!("expected chatMessage");
        };
        assert_eq!(msg.sender_id, a);
        assert_eq!(msg.message, None);
    }

    #[test]
    fn typing_notice_carries_only_the_sender() {
        let sender_id = Uuid::now_v7();
        let json = serde_json::to_value(ServerEvent::Typing { sender_id }).unwrap();
        assert_eq!(json, json!({ "event": "typing", "data": { "senderId": sender_id } }));
    }

    #[test]
    fn join_acknowledgement_names_the_room() {
        let json = serde_json::to_value(ServerEvent::Joined { room: "a_b".to_owned() }).unwrap();
        assert_eq!(json, json!({ "event": "joined", "data": { "room": "a_b" } }));
    }

    #[test]
    fn unknown_events_are_rejected() {
        let frame = json!({ "event": "shout", "data": {} });
        assert!(serde_json::from_value::<ClientEvent>(frame).is_err());
    }
}
