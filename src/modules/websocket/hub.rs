/// Connection Hub
///
/// Actor sở hữu registry connection ↔ room fan-out group. Mọi mutation
/// (connect/disconnect/drop) và mọi broadcast đi qua mailbox của actor,
/// nên thứ tự submit vào một room chính là thứ tự deliver tới từng
/// subscriber. Registry là state cục bộ của hub, được inject vào Event
/// Router qua address, không qua global nào.
use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::modules::notify::notifier::Notifier;

use super::events::{BroadcastToRoom, Connect, Disconnect, DropFromRoom};
use super::session::WsSession;

/// Registry thuần dữ liệu: session ↔ (user, room). Tách khỏi actor để
/// test được trực tiếp.
#[derive(Default)]
pub struct SubscriberRegistry {
    /// Map: room_id -> session ids đang subscribe
    rooms: HashMap<Uuid, HashSet<Uuid>>,
    /// Map: user_id -> session ids (một user có thể mở nhiều connection)
    users: HashMap<Uuid, HashSet<Uuid>>,
    /// Map: session_id -> (user, room) để unregister ngược
    sessions: HashMap<Uuid, (Uuid, Uuid)>,
}

impl SubscriberRegistry {
    pub fn register(&mut self, session_id: Uuid, user_id: Uuid, room_id: Uuid) {
        self.rooms.entry(room_id).or_default().insert(session_id);
        self.users.entry(user_id).or_default().insert(session_id);
        self.sessions.insert(session_id, (user_id, room_id));
    }

    /// Gỡ một session. Idempotent: lần thứ hai trả về None.
    pub fn unregister(&mut self, session_id: Uuid) -> Option<(Uuid, Uuid)> {
        let (user_id, room_id) = self.sessions.remove(&session_id)?;

        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.remove(&session_id);
            if room.is_empty() {
                self.rooms.remove(&room_id);
            }
        }

        if let Some(sessions) = self.users.get_mut(&user_id) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                self.users.remove(&user_id);
            }
        }

        Some((user_id, room_id))
    }

    /// Gỡ mọi session của user khỏi một room, trả về các session bị gỡ.
    pub fn drop_user_from_room(&mut self, room_id: Uuid, user_id: Uuid) -> Vec<Uuid> {
        let Some(user_sessions) = self.users.get(&user_id) else {
            return vec![];
        };

        let affected: Vec<Uuid> = user_sessions
            .iter()
            .filter(|sid| self.sessions.get(sid).is_some_and(|(_, r)| *r == room_id))
            .copied()
            .collect();

        for session_id in &affected {
            self.unregister(*session_id);
        }

        affected
    }

    pub fn room_sessions(&self, room_id: &Uuid) -> Vec<Uuid> {
        self.rooms.get(room_id).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }

    pub fn is_user_online(&self, user_id: &Uuid) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

pub struct ConnectionHub {
    registry: SubscriberRegistry,
    /// Map: session_id -> địa chỉ actor, để đẩy frame
    addrs: HashMap<Uuid, Addr<WsSession>>,
    notifier: Arc<dyn Notifier>,
}

impl ConnectionHub {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { registry: SubscriberRegistry::default(), addrs: HashMap::new(), notifier }
    }
}

impl Actor for ConnectionHub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Connection hub started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Connection hub stopped");
    }
}

impl Handler<Connect> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        self.registry.register(msg.session_id, msg.user_id, msg.room_id);
        self.addrs.insert(msg.session_id, msg.addr);

        tracing::debug!(
            "Session {} (user {}) subscribed to room {} ({} sessions total)",
            msg.session_id,
            msg.user_id,
            msg.room_id,
            self.registry.session_count()
        );
    }
}

impl Handler<Disconnect> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        self.addrs.remove(&msg.session_id);

        if let Some((user_id, room_id)) = self.registry.unregister(msg.session_id) {
            tracing::debug!(
                "Session {} (user {}) unsubscribed from room {}",
                msg.session_id,
                user_id,
                room_id
            );
        }
    }
}

impl Handler<BroadcastToRoom> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: BroadcastToRoom, _: &mut Context<Self>) {
        let mut sent = 0;
        for session_id in self.registry.room_sessions(&msg.room_id) {
            // Session vừa đóng giữa lookup và deliver: bỏ qua, không phải lỗi
            if let Some(addr) = self.addrs.get(&session_id) {
                addr.do_send(msg.frame.clone());
                sent += 1;
            }
        }

        // Member không có connection nào → giao cho notifier, không block
        for member_id in &msg.member_ids {
            if !self.registry.is_user_online(member_id) {
                self.notifier.notify(*member_id, &msg.frame);
            }
        }

        tracing::debug!("Broadcast to room {}: {} sessions", msg.room_id, sent);
    }
}

impl Handler<DropFromRoom> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: DropFromRoom, _: &mut Context<Self>) {
        let dropped = self.registry.drop_user_from_room(msg.room_id, msg.user_id);

        for session_id in &dropped {
            self.addrs.remove(session_id);
        }

        if !dropped.is_empty() {
            tracing::info!(
                "User {} dropped from room {} ({} sessions)",
                msg.user_id,
                msg.room_id,
                dropped.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_room_sessions() {
        let mut reg = SubscriberRegistry::default();
        let room = Uuid::now_v7();
        let user = Uuid::now_v7();
        let session = Uuid::now_v7();

        reg.register(session, user, room);

        assert_eq!(reg.room_sessions(&room), vec![session]);
        assert!(reg.is_user_online(&user));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut reg = SubscriberRegistry::default();
        let room = Uuid::now_v7();
        let user = Uuid::now_v7();
        let session = Uuid::now_v7();

        reg.register(session, user, room);

        assert_eq!(reg.unregister(session), Some((user, room)));
        assert_eq!(reg.unregister(session), None);
        assert!(reg.room_sessions(&room).is_empty());
        assert!(!reg.is_user_online(&user));
    }

    #[test]
    fn test_multi_device_user_stays_online_until_last_session() {
        let mut reg = SubscriberRegistry::default();
        let room = Uuid::now_v7();
        let user = Uuid::now_v7();
        let s1 = Uuid::now_v7();
        let s2 = Uuid::now_v7();

        reg.register(s1, user, room);
        reg.register(s2, user, room);

        reg.unregister(s1);
        assert!(reg.is_user_online(&user));

        reg.unregister(s2);
        assert!(!reg.is_user_online(&user));
    }

    #[test]
    fn test_drop_user_from_room_only_touches_that_room() {
        let mut reg = SubscriberRegistry::default();
        let room_a = Uuid::now_v7();
        let room_b = Uuid::now_v7();
        let user = Uuid::now_v7();
        let in_a = Uuid::now_v7();
        let in_b = Uuid::now_v7();

        reg.register(in_a, user, room_a);
        reg.register(in_b, user, room_b);

        let dropped = reg.drop_user_from_room(room_a, user);

        assert_eq!(dropped, vec![in_a]);
        assert!(reg.room_sessions(&room_a).is_empty());
        assert_eq!(reg.room_sessions(&room_b), vec![in_b]);
        // vẫn online qua session của room B
        assert!(reg.is_user_online(&user));
    }

    #[test]
    fn test_drop_user_not_in_room_is_noop() {
        let mut reg = SubscriberRegistry::default();
        let room = Uuid::now_v7();
        let user = Uuid::now_v7();
        let other = Uuid::now_v7();
        let session = Uuid::now_v7();

        reg.register(session, user, room);

        assert!(reg.drop_user_from_room(room, other).is_empty());
        assert_eq!(reg.room_sessions(&room), vec![session]);
    }
}
