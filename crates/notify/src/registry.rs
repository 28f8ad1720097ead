use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use tutorhub_core::{ConnectionId, UserId};

/// A user's current live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub connected_at: DateTime<Utc>,
}

/// Concurrent user -> connection map.
///
/// - Insert on connect, remove on disconnect, lookup by user.
/// - Last write wins per user; no ordering across users.
/// - A disconnect only removes the connection that is closing, so a stale
///   connection closing late never evicts the user's newer one.
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<UserId, ConnectionInfo>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `connection` as the user's live connection, returning the one
    /// it replaced.
    pub fn connect(&self, user: UserId, connection: ConnectionId) -> Option<ConnectionId> {
        self.connect_at(user, connection, Utc::now())
    }

    pub fn connect_at(
        &self,
        user: UserId,
        connection: ConnectionId,
        connected_at: DateTime<Utc>,
    ) -> Option<ConnectionId> {
        debug!(%user, connection = %connection, "notification connection opened");
        let info = ConnectionInfo {
            connection_id: connection,
            connected_at,
        };
        self.connections
            .write()
            .insert(user, info)
            .map(|previous| previous.connection_id)
    }

    /// Forget `connection` if it is still the user's live connection.
    ///
    /// Returns `true` if the entry was removed.
    pub fn disconnect(&self, user: &UserId, connection: &ConnectionId) -> bool {
        match self.connections.write().entry(*user) {
            Entry::Occupied(entry) if entry.get().connection_id == *connection => {
                entry.remove();
                debug!(%user, %connection, "notification connection closed");
                true
            }
            _ => {
                debug!(%user, %connection, "ignoring disconnect of superseded connection");
                false
            }
        }
    }

    pub fn lookup(&self, user: &UserId) -> Option<ConnectionId> {
        self.connections
            .read()
            .get(user)
            .map(|info| info.connection_id.clone())
    }

    pub fn info(&self, user: &UserId) -> Option<ConnectionInfo> {
        self.connections.read().get(user).cloned()
    }

    /// Connections for the given users that are currently online.
    pub fn lookup_many<'a>(
        &self,
        users: impl IntoIterator<Item = &'a UserId>,
    ) -> Vec<(UserId, ConnectionId)> {
        let connections = self.connections.read();
        users
            .into_iter()
            .filter_map(|user| {
                connections
                    .get(user)
                    .map(|info| (*user, info.connection_id.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
