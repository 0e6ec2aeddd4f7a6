//! Relay session abstraction and identity types
//!
//! The relay network is owned and initialized outside this crate. Everything
//! the transport core needs from it is captured by the [`RelaySession`]
//! trait: accept/close a link to a peer, send a packet, and drain the single
//! inbound packet queue. The embedding layer hands the session to every
//! manager operation as `&mut`, which also covers the host-and-play case
//! where the server and client roles share one underlying session.
//!
//! Peers on the relay are addressed by [`PeerId`], an opaque token issued by
//! the relay's own authentication layer. This crate never inspects its
//! contents; it only compares and hashes it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::Reliability;

// ============================================================================
// Peer Identity
// ============================================================================

/// Opaque, externally issued identity of a peer on the relay network
///
/// Equality is plain value equality on the underlying token. Immutable once
/// obtained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    /// Wrap a raw identity token
    pub fn new(token: impl Into<String>) -> Self {
        PeerId(token.into())
    }

    /// The raw token as issued by the relay
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(token: &str) -> Self {
        PeerId(token.to_string())
    }
}

impl From<String> for PeerId {
    fn from(token: String) -> Self {
        PeerId(token)
    }
}

// ============================================================================
// Inbound Packet
// ============================================================================

/// One packet taken off the relay's inbound queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPacket {
    /// Identity of the sending peer
    pub sender: PeerId,
    /// Logical socket the packet was addressed to
    pub socket: String,
    /// Opaque payload, passed through unchanged
    pub data: Vec<u8>,
    /// Relay channel byte the packet arrived on
    pub channel: u8,
}

// ============================================================================
// Relay Session
// ============================================================================

/// Capabilities this core consumes from the relay SDK binding
///
/// All operations are synchronous and non-blocking. Failure reporting is
/// deliberately coarse: `bool` for operations that can fail, `Option` where
/// absence means "nothing there right now". A `local_peer()` of `None` means
/// the platform session is not ready yet; callers treat that as a transient
/// condition, never as a fatal error.
pub trait RelaySession {
    /// Identity the local endpoint is logged in as, if the platform session
    /// is ready
    fn local_peer(&self) -> Option<PeerId>;

    /// Accept (or establish) a link with `remote` on the named socket
    fn accept(&mut self, local: &PeerId, remote: &PeerId, socket: &str) -> bool;

    /// Close the link with `remote` on the named socket
    fn close(&mut self, local: &PeerId, remote: &PeerId, socket: &str);

    /// Send one packet to `remote`; the relay transmits immediately
    fn send(
        &mut self,
        local: &PeerId,
        remote: &PeerId,
        socket: &str,
        data: &[u8],
        reliability: Reliability,
    ) -> bool;

    /// Number of packets currently queued for the local endpoint
    fn queued_packet_count(&mut self, local: &PeerId) -> usize;

    /// Take the next queued packet, if any
    fn receive_one(&mut self, local: &PeerId) -> Option<InboundPacket>;
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors reported by transport operations
///
/// None of these are fatal: worst case a link stays `Disconnected` and the
/// caller re-invokes `listen`/`connect` at a time of its choosing. Transient
/// conditions (empty queue, nothing to do this tick) are not errors and never
/// show up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The platform session has no logged-in local identity yet
    SessionUnavailable,
    /// The relay refused to accept/establish a link with the peer
    AcceptFailed(PeerId),
    /// `connect` was asked to use the configured remote peer, but none is set
    NoRemoteConfigured,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::SessionUnavailable => {
                write!(f, "platform session unavailable (no local identity)")
            }
            TransportError::AcceptFailed(peer) => {
                write!(f, "relay rejected link with peer {}", peer)
            }
            TransportError::NoRemoteConfigured => {
                write!(f, "no remote peer configured for the client role")
            }
        }
    }
}

impl std::error::Error for TransportError {}

// ============================================================================
// Tests
// ============================================================================
