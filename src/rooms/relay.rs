//! In-memory room table for the realtime relay.
//!
//! Each connection owns an unbounded queue drained by its socket writer, so
//! delivery is FIFO per connection and publishing never waits on a slow
//! client. Nothing here is durable; a dropped connection loses its rooms.

use std::{collections::HashSet, sync::Arc};

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;

pub type ConnectionId = Uuid;

/// Room name for a pair of participants: both ids sorted, joined by `_`.
pub fn room_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

struct Connection {
    user_id: Uuid,
    tx: mpsc::UnboundedSender<ServerEvent>,
    rooms: HashSet<String>,
}

#[derive(Default)]
struct Inner {
    rooms: DashMap<String, HashSet<ConnectionId>>,
    connections: DashMap<ConnectionId, Connection>,
}

/// Connection registry and room fan-out.
#[derive(Clone, Default)]
pub struct Relay {
    inner: Arc<Inner>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, user_id: Uuid) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = Uuid::now_v7();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.connections.insert(id, Connection {
            user_id,
            tx,
            rooms: HashSet::new(),
        });
        (id, rx)
    }

    /// Subscribes `conn` to `room`. Returns false for an unknown connection.
    ///
    /// The room entry goes in first so a concurrent `disconnect` either sees
    /// the room in the connection's set or makes the re-check below fail.
    pub fn join(&self, conn: ConnectionId, room: &str) -> bool {
        self.inner
            .rooms
            .entry(room.to_owned())
            .or_default()
            .insert(conn);

        let registered = match self.inner.connections.get_mut(&conn) {
            Some(mut connection) => {
                connection.rooms.insert(room.to_owned());
                true
            }
            None => false,
        };

        if !registered {
            if let Some(mut members) = self.inner.rooms.get_mut(room) {
                members.remove(&conn);
            }
            self.inner.rooms.remove_if(room, |_, members| members.is_empty());
        }
        registered
    }

    /// Sends to every subscriber of `room`, the publisher's connections included.
    pub fn publish(&self, room: &str, event: ServerEvent) -> usize {
        self.deliver(room, event, None)
    }

    /// Sends to every subscriber of `room` except `except`.
    pub fn publish_except(&self, room: &str, event: ServerEvent, except: ConnectionId) -> usize {
        self.deliver(room, event, Some(except))
    }

    pub fn send_to(&self, conn: ConnectionId, event: ServerEvent) -> bool {
        self.inner
            .connections
            .get(&conn)
            .is_some_and(|connection| connection.tx.send(event).is_ok())
    }

    fn deliver(&self, room: &str, event: ServerEvent, except: Option<ConnectionId>) -> usize {
        // copy the member list so no room shard stays locked while sending
        let Some(members) = self.inner.rooms.get(room).map(|members| members.value().clone()) else {
            return 0;
        };

        members
            .into_iter()
            .filter(|id| Some(*id) != except)
            .filter(|id| self.send_to(*id, event.clone()))
            .count()
    }

    pub fn disconnect(&self, conn: ConnectionId) {
        let Some((_, connection)) = self.inner.connections.remove(&conn) else {
            return;
        };

        for room in &connection.rooms {
            if let Some(mut members) = self.inner.rooms.get_mut(room) {
                members.remove(&conn);
            }
            self.inner.rooms.remove_if(room, |_, members| members.is_empty());
        }

        tracing::debug!(connection = %conn, user_id = %connection.user_id, rooms = connection.rooms.len(), "relay connection dropped");
    }

    pub fn online_connections(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn online_users(&self) -> usize {
        self.inner
            .connections
            .iter()
            .map(|connection| connection.user_id)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn room_size(&self, room: &str) -> usize {
        self.inner.rooms.get(room).map_or(0, |members| members.len())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;
    use crate::rooms::events::ChatMessage;

    fn chat(sender_id: Uuid, receiver_id: Uuid) -> ServerEvent {
        ServerEvent::Message(ChatMessage {
            sender_id,
            receiver_id,
            message: None,
            encrypted_message: "00ff".to_owned(),
        })
    }

    #[test]
    fn room_key_is_order_independent() {
        assert_eq!(room_key("b", "a"), "a_b");
        assert_eq!(room_key("a", "b"), "a_b");
    }

    #[test]
    fn both_members_receive_and_outsiders_do_not() {
        let relay = Relay::new();
        let (a, b, c, d) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let ab = room_key(&a.to_string(), &b.to_string());
        let cd = room_key(&c.to_string(), &d.to_string());

        let (conn_a, mut rx_a) = relay.connect(a);
        let (conn_b, mut rx_b) = relay.connect(b);
        let (conn_c, mut rx_c) = relay.connect(c);
        assert!(relay.join(conn_a, &ab));
        assert!(relay.join(conn_b, &ab));
        assert!(relay.join(conn_c, &cd));

        assert_eq!(relay.publish(&ab, chat(a, b)), 2);
        assert_eq!(rx_a.try_recv().unwrap(), chat(a, b));
        assert_eq!(rx_b.try_recv().unwrap(), chat(a, b));
        assert_eq!(rx_c.try_recv(), Err(TryRecvError::Empty));

        assert_eq!(relay.publish(&ab, chat(b, a)), 2);
        assert_eq!(rx_a.try_recv().unwrap(), chat(b, a));
        assert_eq!(rx_c.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn typing_skips_the_emitting_connection() {
        let relay = Relay::new();
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let room = room_key(&a.to_string(), &b.to_string());

        let (conn_a, mut rx_a) = relay.connect(a);
        let (conn_a2, mut rx_a2) = relay.connect(a);
        let (conn_b, mut rx_b) = relay.connect(b);
        for conn in [conn_a, conn_a2, conn_b] {
            relay.join(conn, &room);
        }

        let typing = ServerEvent::Typing { sender_id: a };
        assert_eq!(relay.publish_except(&room, typing.clone(), conn_a), 2);
        assert_eq!(rx_a.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(rx_a2.try_recv().unwrap(), typing);
        assert_eq!(rx_b.try_recv().unwrap(), typing);
    }

    #[test]
    fn disconnect_drops_membership_and_empty_rooms() {
        let relay = Relay::new();
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let room = room_key(&a.to_string(), &b.to_string());

        let (conn_a, _rx_a) = relay.connect(a);
        let (conn_b, mut rx_b) = relay.connect(b);
        relay.join(conn_a, &room);
        relay.join(conn_b, &room);
        assert_eq!(relay.online_connections(), 2);

        relay.disconnect(conn_a);
        assert_eq!(relay.room_size(&room), 1);
        assert_eq!(relay.publish(&room, chat(b, a)), 1);
        assert!(rx_b.try_recv().is_ok());

        relay.disconnect(conn_b);
        assert_eq!(relay.room_size(&room), 0);
        assert_eq!(relay.online_connections(), 0);
        assert_eq!(relay.publish(&room, chat(b, a)), 0);
    }

    #[test]
    fn join_requires_a_live_connection() {
        let relay = Relay::new();
        assert!(!relay.join(Uuid::now_v7(), "x_y"));
        assert_eq!(relay.room_size("x_y"), 0);
    }

    #[test]
    fn join_after_disconnect_leaves_no_member_behind() {
        let relay = Relay::new();
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let room = room_key(&a.to_string(), &b.to_string());

        let (conn_a, _rx_a) = relay.connect(a);
        let (conn_b, _rx_b) = relay.connect(b);
        relay.join(conn_b, &room);
        relay.disconnect(conn_a);

        assert!(!relay.join(conn_a, &room));
        assert_eq!(relay.room_size(&room), 1);
        assert_eq!(relay.publish(&room, chat(a, b)), 1);
    }

    #[test]
    fn online_users_counts_people_not_sockets() {
        let relay = Relay::new();
        let a = Uuid::now_v7();
        let _first = relay.connect(a);
        let _second = relay.connect(a);
        let _other = relay.connect(Uuid::now_v7());
        assert_eq!(relay.online_connections(), 3);
        assert_eq!(relay.online_users(), 2);
    }
}
