/**
 * Connection Directory
 *
 * Maps a user to the live connections they currently have open (zero when
 * offline, several when multi-device) and a project to the connections that
 * joined its room.
 *
 * # Concurrency
 *
 * All three maps are `DashMap`s, so mutations are serialized per key (per user,
 * per project, per connection) by shard locks. There is no global mutex and a
 * reader never observes a half-applied update for a key. No guard is held
 * across an `.await`; every method here is synchronous.
 *
 * Guards are always released before `remove_if` runs on the same map, since
 * DashMap shard locks are not reentrant.
 */

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::shared::RealtimeEvent;

pub type ConnectionId = Uuid;

/// Sending half of one live connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub user: Uuid,
    tx: mpsc::UnboundedSender<RealtimeEvent>,
}

impl ConnectionHandle {
    pub fn new(user: Uuid, tx: mpsc::UnboundedSender<RealtimeEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            tx,
        }
    }

    /// Push one event; fails only if the receiving side has gone away
    pub fn emit(&self, event: RealtimeEvent) -> BackendResult<()> {
        self.tx
            .send(event)
            .map_err(|_| BackendError::transport(format!("Connection {} is closed", self.id)))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

type ConnectionSet = HashMap<ConnectionId, ConnectionHandle>;

#[derive(Debug, Default)]
pub struct ConnectionDirectory {
    users: DashMap<Uuid, ConnectionSet>,
    rooms: DashMap<Uuid, ConnectionSet>,
    /// Rooms each connection joined, so unregister can leave them all
    joined: DashMap<ConnectionId, HashSet<Uuid>>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new connection for `user` and register it
    pub fn connect(&self, user: Uuid) -> (ConnectionHandle, mpsc::UnboundedReceiver<RealtimeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(user, tx);
        self.register(handle.clone());
        (handle, rx)
    }

    /// Add or replace the mapping for this connection
    pub fn register(&self, handle: ConnectionHandle) {
        tracing::debug!("[Directory] register user={} conn={}", handle.user, handle.id);
        self.users
            .entry(handle.user)
            .or_default()
            .insert(handle.id, handle);
    }

    /// Remove the mapping and leave every joined room. Idempotent.
    pub fn unregister(&self, user: Uuid, connection: ConnectionId) {
        if let Some((_, rooms)) = self.joined.remove(&connection) {
            for room in rooms {
                self.remove_from_room(room, connection);
            }
        }

        if let Some(mut conns) = self.users.get_mut(&user) {
            conns.remove(&connection);
        }
        self.users.remove_if(&user, |_, conns| conns.is_empty());
        tracing::debug!("[Directory] unregister user={} conn={}", user, connection);
    }

    /// Live connections for `user`; empty when offline
    pub fn resolve(&self, user: Uuid) -> Vec<ConnectionHandle> {
        self.users
            .get(&user)
            .map(|conns| conns.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_online(&self, user: Uuid) -> bool {
        self.users.contains_key(&user)
    }

    pub fn join_room(&self, project: Uuid, handle: &ConnectionHandle) {
        self.rooms
            .entry(project)
            .or_default()
            .insert(handle.id, handle.clone());
        self.joined.entry(handle.id).or_default().insert(project);
        tracing::debug!("[Directory] conn={} joined room {}", handle.id, project);
    }

    pub fn leave_room(&self, project: Uuid, connection: ConnectionId) {
        self.remove_from_room(project, connection);
        if let Some(mut rooms) = self.joined.get_mut(&connection) {
            rooms.remove(&project);
        }
        self.joined.remove_if(&connection, |_, rooms| rooms.is_empty());
    }

    pub fn room_connections(&self, project: Uuid) -> Vec<ConnectionHandle> {
        self.rooms
            .get(&project)
            .map(|conns| conns.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every connection whose receiver has gone away. Returns how many
    /// were removed.
    pub fn prune_closed(&self) -> usize {
        let stale: Vec<(Uuid, ConnectionId)> = self
            .users
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .values()
                    .filter(|h| h.is_closed())
                    .map(|h| (h.user, h.id))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (user, connection) in &stale {
            self.unregister(*user, *connection);
        }
        stale.len()
    }

    fn remove_from_room(&self, project: Uuid, connection: ConnectionId) {
        if let Some(mut conns) = self.rooms.get_mut(&project) {
            conns.remove(&connection);
        }
        self.rooms.remove_if(&project, |_, conns| conns.is_empty());
    }
}
