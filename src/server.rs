//! Server role: inbound peer session management
//!
//! The server accepts incoming connection requests on its logical socket,
//! drains the relay's inbound queue once per tick, and translates peer
//! identities into connection ids through the [`ConnectionRegistry`].
//!
//! # Event Flow
//!
//! ```text
//! relay request ──► handle_connection_request ──► accept ──► Connected(id)
//! relay queue   ──► poll_incoming ──► [auto-register] ──► DataReceived(id)
//! caller        ──► close / stop_all ──► Disconnected(id)
//! ```
//!
//! Connect notifications and first data packets can race on the relay, so
//! `poll_incoming` registers any sender it has never seen and emits the
//! `Connected` event itself before surfacing the packet.
//!
//! Events accumulate in an internal queue and are drained by the owner after
//! each operation, which keeps dispatch ordering deterministic and makes
//! re-entrant mutation impossible.

use std::collections::{HashMap, VecDeque};

use crate::channel::Channel;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::session::{PeerId, RelaySession, TransportError};
use crate::state::{ConnectionState, LinkStateCell};

// ============================================================================
// Server Events
// ============================================================================

/// Events produced by the server session, drained by the owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A remote peer's link was accepted (or inferred from its first packet)
    Connected(ConnectionId),
    /// A remote peer's link was closed
    Disconnected(ConnectionId),
    /// A packet arrived from a connected peer
    DataReceived(ConnectionId, Vec<u8>),
}

// ============================================================================
// Server Session
// ============================================================================

/// Manages every inbound peer link for the server role
#[derive(Debug)]
pub struct ServerSession {
    /// Logical socket this server accepts on
    socket_name: String,
    /// Identity ↔ id mapping for connected peers
    registry: ConnectionRegistry,
    /// Explicit per-peer link state
    peer_states: HashMap<ConnectionId, LinkStateCell>,
    /// Pending events for the owner to drain
    events: VecDeque<ServerEvent>,
    /// Whether `listen` has succeeded
    listening: bool,
}

impl ServerSession {
    /// Create a server session bound to a logical socket name
    pub fn new(socket_name: impl Into<String>) -> Self {
        ServerSession {
            socket_name: socket_name.into(),
            registry: ConnectionRegistry::new(),
            peer_states: HashMap::new(),
            events: VecDeque::new(),
            listening: false,
        }
    }

    /// Register interest in inbound connection requests
    ///
    /// Fails with [`TransportError::SessionUnavailable`] when the platform
    /// session has no local identity yet. The caller decides whether and
    /// when to try again; there is no automatic retry.
    pub fn listen<S: RelaySession>(&mut self, session: &mut S) -> Result<(), TransportError> {
        let local = session
            .local_peer()
            .ok_or(TransportError::SessionUnavailable)?;

        self.listening = true;
        log::info!(
            "listening for peers on socket '{}' as {}",
            self.socket_name,
            local
        );
        Ok(())
    }

    /// Whether `listen` has succeeded
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// React to an incoming connection request from the relay
    ///
    /// Requests for other sockets are ignored. A request from an already
    /// connected peer is deduplicated: no second accept, no second event.
    pub fn handle_connection_request<S: RelaySession>(
        &mut self,
        session: &mut S,
        remote: &PeerId,
        socket: &str,
    ) {
        if !self.listening || socket != self.socket_name {
            return;
        }

        if self.registry.id_of(remote).is_some() {
            return;
        }

        let local = match session.local_peer() {
            Some(local) => local,
            None => return,
        };

        if session.accept(&local, remote, &self.socket_name) {
            self.admit(remote);
        } else {
            log::warn!("failed to accept connection request from {}", remote);
        }
    }

    /// Drain the inbound queue once; no-op unless listening
    ///
    /// The queue depth is sampled once at the start; packets arriving during
    /// the drain are picked up on the next tick. A failed receive ends the
    /// drain quietly (queue temporarily empty). A server that is not
    /// listening must not touch the queue at all: on a shared session those
    /// packets belong to the client role.
    pub fn poll_incoming<S: RelaySession>(&mut self, session: &mut S) {
        if !self.listening {
            return;
        }
        let local = match session.local_peer() {
            Some(local) => local,
            None => return,
        };

        let depth = session.queued_packet_count(&local);
        for _ in 0..depth {
            let packet = match session.receive_one(&local) {
                Some(packet) => packet,
                None => break,
            };

            if packet.socket != self.socket_name {
                continue;
            }

            // A peer whose first packet beats its connect notification gets
            // registered here, with the Connected event ahead of its data.
            let id = match self.registry.id_of(&packet.sender) {
                Some(id) => id,
                None => self.admit(&packet.sender),
            };

            self.events.push_back(ServerEvent::DataReceived(id, packet.data));
        }
    }

    /// Send a packet to a connected peer
    ///
    /// Unknown ids are silently dropped: the peer is gone and the caller's
    /// view is simply stale. Returns whether the relay took the packet.
    pub fn send_to<S: RelaySession>(
        &mut self,
        session: &mut S,
        id: ConnectionId,
        data: &[u8],
        channel: Channel,
    ) -> bool {
        let remote = match self.registry.peer_of(id) {
            Some(remote) => remote.clone(),
            None => return false,
        };
        let local = match session.local_peer() {
            Some(local) => local,
            None => return false,
        };

        let sent = session.send(&local, &remote, &self.socket_name, data, channel.reliability());
        if !sent {
            log::error!("failed to send {} bytes to connection {}", data.len(), id);
        }
        sent
    }

    /// Close one peer link and forget its mapping
    ///
    /// Unknown ids are a no-op.
    pub fn close<S: RelaySession>(&mut self, session: &mut S, id: ConnectionId) {
        let remote = match self.registry.peer_of(id) {
            Some(remote) => remote.clone(),
            None => return,
        };

        if let Some(local) = session.local_peer() {
            session.close(&local, &remote, &self.socket_name);
        }

        if let Some(state) = self.peer_states.get_mut(&id) {
            if state.set(ConnectionState::Disconnected).is_some() {
                self.events.push_back(ServerEvent::Disconnected(id));
            }
        }
        self.peer_states.remove(&id);
        self.registry.remove(id);
    }

    /// Close every peer link and clear the registry
    ///
    /// Peers are logically independent; no particular close order is
    /// promised.
    pub fn stop_all<S: RelaySession>(&mut self, session: &mut S) {
        for id in self.registry.ids() {
            self.close(session, id);
        }
        self.registry.clear();
        self.peer_states.clear();
        self.listening = false;
    }

    /// Pop the oldest pending event
    pub fn next_event(&mut self) -> Option<ServerEvent> {
        self.events.pop_front()
    }

    /// Take every pending event at once
    pub fn drain_events(&mut self) -> Vec<ServerEvent> {
        self.events.drain(..).collect()
    }

    /// Number of currently connected peers
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Link state of one peer, if connected
    pub fn peer_state(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.peer_states.get(&id).map(|cell| cell.get())
    }

    /// Register a peer and mark its link connected
    fn admit(&mut self, remote: &PeerId) -> ConnectionId {
        let id = self.registry.register(remote);
        let state = self.peer_states.entry(id).or_default();
        if state.set(ConnectionState::Connected).is_some() {
            self.events.push_back(ServerEvent::Connected(id));
        }
        id
    }
}

// ============================================================================
// Tests
// ============================================================================
