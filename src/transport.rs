//! Transport facade: one addressable transport over both roles
//!
//! [`Transport`] owns the relay session plus one [`ServerSession`] and one
//! [`ClientSession`], and presents the surrounding networking framework with
//! a single surface:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Transport                          │
//! ├──────────────────────────────────────────────────────────┤
//! │  listen / stop_listening          server role            │
//! │  connect / disconnect             client role            │
//! │  send_to_peer / close_peer        by connection id       │
//! │  send_to_server                   single outbound link   │
//! │  poll                             once per tick          │
//! │  drain_events                     unified event stream   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Both roles can be active at once (host-and-play); they share the one
//! relay session and stay out of each other's traffic through socket-name
//! and sender filtering in the managers.
//!
//! Manager events are pumped into one [`TransportEvent`] queue tagged with
//! the originating role, so the framework above never deals with two event
//! sources or with callback re-entrancy.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::client::{ClientEvent, ClientSession};
use crate::registry::ConnectionId;
use crate::server::{ServerEvent, ServerSession};
use crate::session::{PeerId, RelaySession, TransportError};
use crate::state::{ConnectionState, LinkStateCell};

// ============================================================================
// Constants
// ============================================================================

/// Logical socket used when the configuration does not name one
pub const DEFAULT_SOCKET_NAME: &str = "relay-transport";

// ============================================================================
// Configuration
// ============================================================================

/// Static transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Logical socket name; both roles accept and send on it
    #[serde(default = "default_socket_name")]
    pub socket_name: String,
    /// Remote peer the client role connects to when `connect` is called
    /// without an explicit identity
    #[serde(default)]
    pub remote_peer: Option<PeerId>,
}

fn default_socket_name() -> String {
    DEFAULT_SOCKET_NAME.to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            socket_name: default_socket_name(),
            remote_peer: None,
        }
    }
}

impl TransportConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Transport Events
// ============================================================================

/// Unified event stream of the transport
///
/// `server` distinguishes the role the event belongs to. Client-role events
/// always carry [`ConnectionId::REMOTE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A link came up
    Connected { conn: ConnectionId, server: bool },
    /// A link went down
    Disconnected { conn: ConnectionId, server: bool },
    /// A packet arrived on a link
    DataReceived {
        conn: ConnectionId,
        data: Vec<u8>,
        server: bool,
    },
    /// A packet was handed to the relay for a link
    DataSent { conn: ConnectionId, server: bool },
    /// A role's aggregate state changed (listener state for the server
    /// role, link state for the client role)
    StateChanged {
        state: ConnectionState,
        server: bool,
    },
}

// ============================================================================
// Transport
// ============================================================================

/// Aggregate transport over one relay session
#[derive(Debug)]
pub struct Transport<S: RelaySession> {
    session: S,
    config: TransportConfig,
    server: ServerSession,
    client: ClientSession,
    /// Listener lifecycle for the server role
    listener_state: LinkStateCell,
    /// Mirror of the client session's link state
    client_state: LinkStateCell,
    /// Live server-role connection ids, in connect order
    connections: Vec<ConnectionId>,
    events: VecDeque<TransportEvent>,
}

impl<S: RelaySession> Transport<S> {
    /// Create a transport over an already-initialized relay session
    pub fn new(session: S, config: TransportConfig) -> Self {
        let server = ServerSession::new(config.socket_name.clone());
        let client = ClientSession::new(config.socket_name.clone());
        Transport {
            session,
            config,
            server,
            client,
            listener_state: LinkStateCell::new(),
            client_state: LinkStateCell::new(),
            connections: Vec::new(),
            events: VecDeque::new(),
        }
    }

    // ------------------------------------------------------------------
    // Server role
    // ------------------------------------------------------------------

    /// Start accepting inbound peers
    ///
    /// An already-listening transport is stopped first. Failure leaves the
    /// listener `Disconnected`; the caller may call `listen` again later.
    pub fn listen(&mut self) -> Result<(), TransportError> {
        if self.server.is_listening() {
            self.stop_listening();
        }

        self.set_listener_state(ConnectionState::Connecting);

        match self.server.listen(&mut self.session) {
            Ok(()) => {
                self.set_listener_state(ConnectionState::Connected);
                Ok(())
            }
            Err(err) => {
                log::error!("failed to start listening: {}", err);
                self.set_listener_state(ConnectionState::Disconnecting);
                self.set_listener_state(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    /// Close every inbound peer link and stop accepting new ones
    pub fn stop_listening(&mut self) {
        if self.listener_state.get() != ConnectionState::Disconnected {
            self.set_listener_state(ConnectionState::Disconnecting);
        }

        self.server.stop_all(&mut self.session);
        self.pump_server_events();
        self.set_listener_state(ConnectionState::Disconnected);
    }

    /// Forward an incoming connection request from the relay binding
    pub fn handle_connection_request(&mut self, remote: &PeerId, socket: &str) {
        self.server
            .handle_connection_request(&mut self.session, remote, socket);
        self.pump_server_events();
    }

    /// Send to one connected peer
    ///
    /// Requires a `Connected` listener and a valid (positive) id; anything
    /// else is a quiet no-op, matching the caller's stale view of the peer
    /// set.
    pub fn send_to_peer(&mut self, conn: ConnectionId, data: &[u8], channel: Channel) -> bool {
        if self.listener_state.get() != ConnectionState::Connected || !conn.is_valid() {
            return false;
        }

        let sent = self.server.send_to(&mut self.session, conn, data, channel);
        if sent {
            self.events
                .push_back(TransportEvent::DataSent { conn, server: true });
        }
        sent
    }

    /// Close one peer link
    pub fn close_peer(&mut self, conn: ConnectionId) {
        self.server.close(&mut self.session, conn);
        self.pump_server_events();
    }

    // ------------------------------------------------------------------
    // Client role
    // ------------------------------------------------------------------

    /// Connect the client role to the configured remote peer
    pub fn connect(&mut self) -> Result<(), TransportError> {
        let remote = self
            .config
            .remote_peer
            .clone()
            .ok_or(TransportError::NoRemoteConfigured)?;
        self.connect_to(remote)
    }

    /// Connect the client role to an explicit remote peer
    ///
    /// An already-active link is torn down first. Failure is reported but
    /// not retried.
    pub fn connect_to(&mut self, remote: PeerId) -> Result<(), TransportError> {
        if self.client.state() != ConnectionState::Disconnected {
            self.disconnect();
        }

        let result = self.client.connect(&mut self.session, remote);
        if let Err(err) = &result {
            log::error!("failed to connect to server: {}", err);
        }
        self.pump_client_events();
        result
    }

    /// Tear down the client-role link
    pub fn disconnect(&mut self) {
        self.client.stop(&mut self.session);
        self.pump_client_events();
    }

    /// Send on the client-role link
    pub fn send_to_server(&mut self, data: &[u8], channel: Channel) -> bool {
        let sent = self.client.send(&mut self.session, data, channel);
        if sent {
            self.events.push_back(TransportEvent::DataSent {
                conn: ConnectionId::REMOTE,
                server: false,
            });
        }
        sent
    }

    // ------------------------------------------------------------------
    // Tick driver
    // ------------------------------------------------------------------

    /// Drain both roles' inbound queues; call once per tick
    pub fn poll(&mut self) {
        self.server.poll_incoming(&mut self.session);
        self.pump_server_events();
        self.client.poll_incoming(&mut self.session);
        self.pump_client_events();
    }

    /// Flush buffered outbound data
    ///
    /// Deliberate no-op: the relay transmits at send time and this transport
    /// adds no batching layer. Kept so tick drivers can treat all transports
    /// uniformly.
    pub fn flush(&mut self) {}

    /// Pop the oldest pending event
    pub fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.pop_front()
    }

    /// Take every pending event at once
    pub fn drain_events(&mut self) -> Vec<TransportEvent> {
        self.events.drain(..).collect()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Live server-role connection ids, in connect order
    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    /// Server-role listener state
    pub fn listener_state(&self) -> ConnectionState {
        self.listener_state.get()
    }

    /// Client-role link state
    pub fn client_state(&self) -> ConnectionState {
        self.client_state.get()
    }

    /// The transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// The underlying relay session (for the embedding SDK binding)
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    // ------------------------------------------------------------------
    // Event pumps
    // ------------------------------------------------------------------

    fn set_listener_state(&mut self, new: ConnectionState) {
        if let Some(state) = self.listener_state.set(new) {
            self.events.push_back(TransportEvent::StateChanged {
                state,
                server: true,
            });
        }
    }

    fn pump_server_events(&mut self) {
        for event in self.server.drain_events() {
            match event {
                ServerEvent::Connected(conn) => {
                    self.connections.push(conn);
                    self.events
                        .push_back(TransportEvent::Connected { conn, server: true });
                }
                ServerEvent::Disconnected(conn) => {
                    self.connections.retain(|c| *c != conn);
                    self.events
                        .push_back(TransportEvent::Disconnected { conn, server: true });
                }
                ServerEvent::DataReceived(conn, data) => {
                    self.events.push_back(TransportEvent::DataReceived {
                        conn,
                        data,
                        server: true,
                    });
                }
            }
        }
    }

    fn pump_client_events(&mut self) {
        for event in self.client.drain_events() {
            match event {
                ClientEvent::StateChanged(state) => {
                    match state {
                        ConnectionState::Connected => {
                            self.events.push_back(TransportEvent::Connected {
                                conn: ConnectionId::REMOTE,
                                server: false,
                            });
                        }
                        ConnectionState::Disconnected => {
                            self.events.push_back(TransportEvent::Disconnected {
                                conn: ConnectionId::REMOTE,
                                server: false,
                            });
                        }
                        _ => {}
                    }
                    if let Some(state) = self.client_state.set(state) {
                        self.events.push_back(TransportEvent::StateChanged {
                            state,
                            server: false,
                        });
                    }
                }
                ClientEvent::DataReceived(data) => {
                    self.events.push_back(TransportEvent::DataReceived {
                        conn: ConnectionId::REMOTE,
                        data,
                        server: false,
                    });
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
