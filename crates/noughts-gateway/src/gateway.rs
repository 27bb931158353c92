//! The connection registry and room-addressed delivery.
//!
//! # Concurrency note
//!
//! `Gateway` itself is a plain struct with `&mut self` methods. It is
//! shared between connection handlers and game actors as a
//! [`SharedGateway`], and every method is synchronous, so the lock is
//! never held across an await on I/O.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use noughts_protocol::{GameId, PlayerId, ServerEvent};
use noughts_transport::ConnectionId;
use tokio::sync::{mpsc, Mutex};

use crate::GatewayError;

/// The write half of a player's outbound queue.
///
/// Unbounded so a game actor never waits on a slow client; the
/// connection handler drains it onto the socket.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// The read half, owned by the connection handler.
pub type PlayerReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// A gateway shared across tasks.
pub type SharedGateway = Arc<Mutex<Gateway>>;

/// Who should receive an outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// One player, whether or not they are in a room.
    Player(PlayerId),

    /// Every member of a game's room.
    Room(GameId),

    /// Every member of a game's room except one, usually the player
    /// whose action caused the event.
    RoomExcept(GameId, PlayerId),
}

struct Registration {
    conn_id: ConnectionId,
    sender: PlayerSender,
}

/// Tracks live connections and room membership.
#[derive(Default)]
pub struct Gateway {
    connections: HashMap<PlayerId, Registration>,
    rooms: HashMap<GameId, HashSet<PlayerId>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a new gateway for sharing.
    pub fn shared() -> SharedGateway {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Registers the live connection for `player` and returns the queue the
    /// handler must drain.
    ///
    /// # Errors
    /// [`GatewayError::AlreadyConnected`] if the player already has a live
    /// connection. The existing connection is left untouched.
    pub fn register(
        &mut self,
        player_id: PlayerId,
        conn_id: ConnectionId,
    ) -> Result<PlayerReceiver, GatewayError> {
        if self.connections.contains_key(&player_id) {
            return Err(GatewayError::AlreadyConnected(player_id));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        tracing::debug!(%player_id, %conn_id, "connection registered");
        self.connections
            .insert(player_id, Registration { conn_id, sender });
        Ok(receiver)
    }

    /// Removes `player`'s registration, but only if it still belongs to
    /// `conn_id`. Returns whether anything was removed.
    ///
    /// The check stops a late cleanup from an old connection from
    /// unregistering the player's newer one.
    pub fn unregister(&mut self, player_id: &PlayerId, conn_id: ConnectionId) -> bool {
        match self.connections.get(player_id) {
            Some(reg) if reg.conn_id == conn_id => {
                self.connections.remove(player_id);
                tracing::debug!(%player_id, %conn_id, "connection unregistered");
                true
            }
            _ => false,
        }
    }

    pub fn is_connected(&self, player_id: &PlayerId) -> bool {
        self.connections.contains_key(player_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Adds `player` to the room for `game_id`, creating the room if needed.
    pub fn join_room(&mut self, game_id: &GameId, player_id: PlayerId) {
        tracing::debug!(%game_id, %player_id, "joined room");
        self.rooms
            .entry(game_id.clone())
            .or_default()
            .insert(player_id);
    }

    /// Removes `player` from the room. An emptied room is dropped.
    pub fn leave_room(&mut self, game_id: &GameId, player_id: &PlayerId) {
        if let Some(members) = self.rooms.get_mut(game_id) {
            members.remove(player_id);
            if members.is_empty() {
                self.rooms.remove(game_id);
            }
        }
    }

    /// Removes every member from the room.
    pub fn close_room(&mut self, game_id: &GameId) {
        if self.rooms.remove(game_id).is_some() {
            tracing::debug!(%game_id, "room closed");
        }
    }

    /// Current members of a room, sorted for stable output.
    pub fn members(&self, game_id: &GameId) -> Vec<PlayerId> {
        let mut members: Vec<PlayerId> = self
            .rooms
            .get(game_id)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Queues `event` for every player `recipient` names and returns how
    /// many queues accepted it.
    ///
    /// Players without a live connection are skipped silently; a game
    /// keeps running whether or not anyone is listening.
    pub fn deliver(&self, recipient: Recipient, event: ServerEvent) -> usize {
        match recipient {
            Recipient::Player(player_id) => usize::from(self.send_to(&player_id, event)),
            Recipient::Room(game_id) => self.broadcast(&game_id, None, event),
            Recipient::RoomExcept(game_id, excluded) => {
                self.broadcast(&game_id, Some(&excluded), event)
            }
        }
    }

    fn broadcast(
        &self,
        game_id: &GameId,
        excluded: Option<&PlayerId>,
        event: ServerEvent,
    ) -> usize {
        let Some(members) = self.rooms.get(game_id) else {
            return 0;
        };
        members
            .iter()
            .filter(|pid| Some(*pid) != excluded)
            .filter(|pid| self.send_to(pid, event.clone()))
            .count()
    }

    fn send_to(&self, player_id: &PlayerId, event: ServerEvent) -> bool {
        match self.connections.get(player_id) {
            Some(reg) => reg.sender.send(event).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    fn waiting(game: &str) -> ServerEvent {
        ServerEvent::JoinedWaiting {
            game_id: GameId::new(game),
        }
    }

    #[test]
    fn test_register_twice_returns_already_connected() {
        let mut gw = Gateway::new();
        let _rx = gw.register(pid("alice"), ConnectionId::new(1)).unwrap();
        let result = gw.register(pid("alice"), ConnectionId::new(2));
        assert!(matches!(result, Err(GatewayError::AlreadyConnected(_))));
        assert_eq!(gw.connection_count(), 1);
    }

    #[test]
    fn test_unregister_stale_connection_is_ignored() {
        let mut gw = Gateway::new();
        let _rx = gw.register(pid("alice"), ConnectionId::new(1)).unwrap();

        assert!(!gw.unregister(&pid("alice"), ConnectionId::new(9)));
        assert!(gw.is_connected(&pid("alice")));

        assert!(gw.unregister(&pid("alice"), ConnectionId::new(1)));
        assert!(!gw.is_connected(&pid("alice")));
    }

    #[test]
    fn test_deliver_player_reaches_only_that_player() {
        let mut gw = Gateway::new();
        let mut a = gw.register(pid("a"), ConnectionId::new(1)).unwrap();
        let mut b = gw.register(pid("b"), ConnectionId::new(2)).unwrap();

        assert_eq!(gw.deliver(Recipient::Player(pid("a")), waiting("g")), 1);
        assert_eq!(a.try_recv().unwrap(), waiting("g"));
        assert!(b.try_recv().is_err());
    }

    #[test]
    fn test_deliver_room_except_skips_excluded_member() {
        let mut gw = Gateway::new();
        let game = GameId::new("g");
        let mut a = gw.register(pid("a"), ConnectionId::new(1)).unwrap();
        let mut b = gw.register(pid("b"), ConnectionId::new(2)).unwrap();
        gw.join_room(&game, pid("a"));
        gw.join_room(&game, pid("b"));

        let sent = gw.deliver(Recipient::RoomExcept(game.clone(), pid("a")), waiting("g"));
        assert_eq!(sent, 1);
        assert!(a.try_recv().is_err());
        assert_eq!(b.try_recv().unwrap(), waiting("g"));

        assert_eq!(gw.deliver(Recipient::Room(game), waiting("g")), 2);
    }

    #[test]
    fn test_deliver_to_disconnected_member_is_dropped() {
        let mut gw = Gateway::new();
        let game = GameId::new("g");
        gw.join_room(&game, pid("ghost"));
        assert_eq!(gw.deliver(Recipient::Room(game), waiting("g")), 0);
        assert_eq!(gw.deliver(Recipient::Player(pid("nobody")), waiting("g")), 0);
    }

    #[test]
    fn test_close_room_removes_all_members() {
        let mut gw = Gateway::new();
        let game = GameId::new("g");
        gw.join_room(&game, pid("b"));
        gw.join_room(&game, pid("a"));
        assert_eq!(gw.members(&game), vec![pid("a"), pid("b")]);

        gw.close_room(&game);
        assert!(gw.members(&game).is_empty());
    }

    #[test]
    fn test_leave_room_last_member_drops_room() {
        let mut gw = Gateway::new();
        let game = GameId::new("g");
        gw.join_room(&game, pid("a"));
        gw.leave_room(&game, &pid("a"));
        assert!(gw.members(&game).is_empty());
        assert!(gw.rooms.is_empty());
    }
}
