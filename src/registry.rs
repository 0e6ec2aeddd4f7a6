//! Connection registry: peer identity ↔ connection id mapping
//!
//! The networking stack above the transport addresses peers by small
//! integers, the relay addresses them by opaque identity tokens. The
//! registry maintains the two maps:
//!
//! - connection id → peer identity
//! - peer identity → connection id
//!
//! Ids are allocated monotonically starting at 1 and are never reused within
//! a registry lifetime, even after the peer disconnects. A re-registered
//! identity therefore always comes back with a new, larger id, so a stale id
//! held by the caller can never silently alias a different peer.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::PeerId;

// ============================================================================
// Connection Id
// ============================================================================

/// Process-local integer alias for a peer identity
///
/// Ids handed out by the registry are always >= 1. Zero is reserved for the
/// client role's single remote link ([`ConnectionId::REMOTE`]); negative
/// values are never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub i32);

impl ConnectionId {
    /// Sentinel id for the remote endpoint of the client-role link
    pub const REMOTE: ConnectionId = ConnectionId(0);

    /// Whether this id could have been allocated by a registry
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Bidirectional peer identity ↔ connection id map with monotonic allocation
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Map from connection id to peer identity
    peers: HashMap<ConnectionId, PeerId>,
    /// Reverse map from peer identity to connection id
    ids: HashMap<PeerId, ConnectionId>,
    /// Next id to hand out; starts at 1, never decreases
    next_id: i32,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ConnectionRegistry {
            peers: HashMap::new(),
            ids: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a peer, returning its connection id
    ///
    /// Idempotent: a peer that is already registered keeps its existing id.
    pub fn register(&mut self, peer: &PeerId) -> ConnectionId {
        if let Some(&id) = self.ids.get(peer) {
            return id;
        }

        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.peers.insert(id, peer.clone());
        self.ids.insert(peer.clone(), id);

        log::debug!("registered peer {} as connection {}", peer, id);
        id
    }

    /// Look up the peer identity behind a connection id
    pub fn peer_of(&self, id: ConnectionId) -> Option<&PeerId> {
        self.peers.get(&id)
    }

    /// Look up the connection id assigned to a peer identity
    pub fn id_of(&self, peer: &PeerId) -> Option<ConnectionId> {
        self.ids.get(peer).copied()
    }

    /// Remove a mapping in both directions
    ///
    /// Removing an unknown id is a no-op. The id is not returned to the
    /// allocator.
    pub fn remove(&mut self, id: ConnectionId) -> Option<PeerId> {
        let peer = self.peers.remove(&id)?;
        self.ids.remove(&peer);
        log::debug!("removed connection {} (peer {})", id, peer);
        Some(peer)
    }

    /// All currently registered connection ids, in no particular order
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.peers.keys().copied().collect()
    }

    /// Number of live mappings
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peers are registered
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Drop every mapping; the allocation counter keeps its value
    pub fn clear(&mut self) {
        self.peers.clear();
        self.ids.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
