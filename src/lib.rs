//! Peer-to-peer transport core over an online-services relay network
//!
//! This crate bridges an integer-keyed multiplayer networking stack to a
//! relay/NAT-traversal service that addresses peers by opaque string
//! identities. The relay SDK itself stays outside the crate behind the
//! [`RelaySession`] trait; everything here is the connection-identity and
//! connection-state core.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     Module Structure                           │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                │
//! │  registry.rs   - peer identity ↔ connection id mapping         │
//! │  state.rs      - per-link connection state machine             │
//! │  channel.rs    - delivery channels → relay reliability         │
//! │  session.rs    - RelaySession trait, PeerId, errors            │
//! │  server.rs     - inbound peer session manager                  │
//! │  client.rs     - single outbound link manager                  │
//! │  transport.rs  - facade aggregating both roles                 │
//! │                                                                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage Model
//!
//! Everything is single-threaded and tick-driven. The embedding layer owns
//! the loop: it calls [`Transport::poll`] once per tick, forwards the SDK's
//! incoming-connection notifications to
//! [`Transport::handle_connection_request`], and consumes the resulting
//! [`TransportEvent`]s from [`Transport::drain_events`]. Nothing here
//! blocks, spawns, or retries; failed operations leave the affected link
//! `Disconnected` and the caller decides when to try again.

pub mod channel;
pub mod client;
pub mod registry;
pub mod server;
pub mod session;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the full public surface at the crate root.
pub use channel::{Channel, Reliability};
pub use client::{ClientEvent, ClientSession};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use server::{ServerEvent, ServerSession};
pub use session::{InboundPacket, PeerId, RelaySession, TransportError};
pub use state::{ConnectionState, LinkStateCell};
pub use transport::{Transport, TransportConfig, TransportEvent, DEFAULT_SOCKET_NAME};
