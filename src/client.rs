//! Client role: single outbound link management
//!
//! The client drives exactly one link to one pre-known remote peer. Its
//! lifecycle is the four-state machine from [`crate::state`]:
//!
//! ```text
//! Disconnected ─connect─► Connecting ─accept ok─► Connected ─stop─► Disconnecting ─► Disconnected
//!                             │
//!                             └─accept failed──► Disconnected
//! ```
//!
//! The relay delivers every inbound packet for the local endpoint through
//! one shared queue, so when other logical links are active on the same
//! session the client can see packets that are not for it. `poll_incoming`
//! therefore only surfaces packets whose sender is the connected remote;
//! everything else is dropped without comment.

use std::collections::VecDeque;

use crate::channel::Channel;
use crate::session::{PeerId, RelaySession, TransportError};
use crate::state::{ConnectionState, LinkStateCell};

// ============================================================================
// Client Events
// ============================================================================

/// Events produced by the client session, drained by the owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The link transitioned to a new state
    StateChanged(ConnectionState),
    /// A packet arrived from the connected remote
    DataReceived(Vec<u8>),
}

// ============================================================================
// Client Session
// ============================================================================

/// Manages the single outbound link for the client role
#[derive(Debug)]
pub struct ClientSession {
    /// Logical socket the link lives on
    socket_name: String,
    /// Remote peer this client is (or was last) connected to
    remote: Option<PeerId>,
    /// Link state
    state: LinkStateCell,
    /// Pending events for the owner to drain
    events: VecDeque<ClientEvent>,
}

impl ClientSession {
    /// Create a client session bound to a logical socket name
    pub fn new(socket_name: impl Into<String>) -> Self {
        ClientSession {
            socket_name: socket_name.into(),
            remote: None,
            state: LinkStateCell::new(),
            events: VecDeque::new(),
        }
    }

    /// Establish the link to `remote`
    ///
    /// On failure the state falls straight back to `Disconnected` (never
    /// through `Disconnecting`) and the error is returned for the caller to
    /// log or act on. There is no automatic retry.
    pub fn connect<S: RelaySession>(
        &mut self,
        session: &mut S,
        remote: PeerId,
    ) -> Result<(), TransportError> {
        self.remote = Some(remote.clone());
        self.set_state(ConnectionState::Connecting);

        let local = match session.local_peer() {
            Some(local) => local,
            None => {
                self.set_state(ConnectionState::Disconnected);
                return Err(TransportError::SessionUnavailable);
            }
        };

        if session.accept(&local, &remote, &self.socket_name) {
            self.set_state(ConnectionState::Connected);
            log::info!("connected to {} on socket '{}'", remote, self.socket_name);
            Ok(())
        } else {
            self.set_state(ConnectionState::Disconnected);
            Err(TransportError::AcceptFailed(remote))
        }
    }

    /// Send a packet to the connected remote; no-op unless `Connected`
    pub fn send<S: RelaySession>(&mut self, session: &mut S, data: &[u8], channel: Channel) -> bool {
        if self.state.get() != ConnectionState::Connected {
            return false;
        }
        let (local, remote) = match (session.local_peer(), &self.remote) {
            (Some(local), Some(remote)) => (local, remote.clone()),
            _ => return false,
        };

        let sent = session.send(&local, &remote, &self.socket_name, data, channel.reliability());
        if !sent {
            log::error!("failed to send {} bytes to {}", data.len(), remote);
        }
        sent
    }

    /// Drain the inbound queue once; no-op unless `Connected`
    ///
    /// Same drain contract as the server: depth sampled once, a failed
    /// receive ends the drain for this tick. Packets from any sender other
    /// than the connected remote are discarded.
    pub fn poll_incoming<S: RelaySession>(&mut self, session: &mut S) {
        if self.state.get() != ConnectionState::Connected {
            return;
        }
        let (local, remote) = match (session.local_peer(), &self.remote) {
            (Some(local), Some(remote)) => (local, remote.clone()),
            _ => return,
        };

        let depth = session.queued_packet_count(&local);
        for _ in 0..depth {
            let packet = match session.receive_one(&local) {
                Some(packet) => packet,
                None => break,
            };

            if packet.socket != self.socket_name || packet.sender != remote {
                continue;
            }

            self.events.push_back(ClientEvent::DataReceived(packet.data));
        }
    }

    /// Tear the link down
    ///
    /// Passes through `Disconnecting` before settling on `Disconnected`.
    /// Already-disconnected links are left alone.
    pub fn stop<S: RelaySession>(&mut self, session: &mut S) {
        if self.state.get() == ConnectionState::Disconnected {
            return;
        }

        self.set_state(ConnectionState::Disconnecting);

        if let (Some(local), Some(remote)) = (session.local_peer(), &self.remote) {
            session.close(&local, remote, &self.socket_name);
        }

        self.set_state(ConnectionState::Disconnected);
    }

    /// Current link state
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Remote peer the link targets, if `connect` was ever called
    pub fn remote(&self) -> Option<&PeerId> {
        self.remote.as_ref()
    }

    /// Pop the oldest pending event
    pub fn next_event(&mut self) -> Option<ClientEvent> {
        self.events.pop_front()
    }

    /// Take every pending event at once
    pub fn drain_events(&mut self) -> Vec<ClientEvent> {
        self.events.drain(..).collect()
    }

    fn set_state(&mut self, new: ConnectionState) {
        if let Some(state) = self.state.set(new) {
            self.events.push_back(ClientEvent::StateChanged(state));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRelay;

    const SOCKET: &str = "game";

    fn connected_client(relay: &mut MockRelay) -> ClientSession {
        let mut client = ClientSession::new(SOCKET);
        client
            .connect(relay, PeerId::from("PUID-X"))
            .expect("connect succeeds");
        client.drain_events();
        client
    }

    #[test]
    fn test_connect_success_states() {
        let mut relay = MockRelay::new("local");
        let mut client = ClientSession::new(SOCKET);

        client.connect(&mut relay, PeerId::from("PUID-X")).unwrap();

        assert_eq!(client.state(), ConnectionState::Connected);
        assert_eq!(
            client.drain_events(),
            vec![
                ClientEvent::StateChanged(ConnectionState::Connecting),
                ClientEvent::StateChanged(ConnectionState::Connected),
            ]
        );
        assert_eq!(relay.accepted, vec![(PeerId::from("PUID-X"), SOCKET.to_string())]);
    }

    #[test]
    fn test_connect_accept_failure_falls_back_to_disconnected() {
        let mut relay = MockRelay::new("local");
        relay.refuse_accept = true;
        let mut client = ClientSession::new(SOCKET);

        let err = client.connect(&mut relay, PeerId::from("PUID-X"));

        assert_eq!(err, Err(TransportError::AcceptFailed(PeerId::from("PUID-X"))));
        assert_eq!(client.state(), ConnectionState::Disconnected);
        // Two notifications, never Connected, never Disconnecting.
        assert_eq!(
            client.drain_events(),
            vec![
                ClientEvent::StateChanged(ConnectionState::Connecting),
                ClientEvent::StateChanged(ConnectionState::Disconnected),
            ]
        );
    }

    #[test]
    fn test_connect_without_local_identity() {
        let mut relay = MockRelay::without_identity();
        let mut client = ClientSession::new(SOCKET);

        let err = client.connect(&mut relay, PeerId::from("PUID-X"));

        assert_eq!(err, Err(TransportError::SessionUnavailable));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_send_requires_connected() {
        let mut relay = MockRelay::new("local");
        let mut client = ClientSession::new(SOCKET);

        assert!(!client.send(&mut relay, &[1, 2], Channel::ReliableOrdered));
        assert!(relay.sent.is_empty());
    }

    #[test]
    fn test_send_when_connected() {
        let mut relay = MockRelay::new("local");
        let mut client = connected_client(&mut relay);

        assert!(client.send(&mut relay, &[1, 2], Channel::ReliableOrdered));
        assert_eq!(relay.sent.len(), 1);
        assert_eq!(relay.sent[0].remote, PeerId::from("PUID-X"));
    }

    #[test]
    fn test_poll_filters_foreign_senders() {
        let mut relay = MockRelay::new("local");
        let mut client = connected_client(&mut relay);

        relay.queue_packet("PUID-X", SOCKET, vec![1]);
        relay.queue_packet("PUID-B", SOCKET, vec![2]);
        relay.queue_packet("PUID-X", SOCKET, vec![3]);
        relay.queue_packet("PUID-B", SOCKET, vec![4]);

        client.poll_incoming(&mut relay);

        assert_eq!(
            client.drain_events(),
            vec![
                ClientEvent::DataReceived(vec![1]),
                ClientEvent::DataReceived(vec![3]),
            ]
        );
    }

    #[test]
    fn test_poll_filters_foreign_sockets() {
        let mut relay = MockRelay::new("local");
        let mut client = connected_client(&mut relay);

        relay.queue_packet("PUID-X", "other-socket", vec![1]);
        client.poll_incoming(&mut relay);

        assert!(client.drain_events().is_empty());
    }

    #[test]
    fn test_poll_is_noop_unless_connected() {
        let mut relay = MockRelay::new("local");
        let mut client = ClientSession::new(SOCKET);

        relay.queue_packet("PUID-X", SOCKET, vec![1]);
        client.poll_incoming(&mut relay);

        assert!(client.drain_events().is_empty());
        // The packet stays queued; a disconnected client must not eat it.
        assert_eq!(relay.inbound.len(), 1);
    }

    #[test]
    fn test_stop_passes_through_disconnecting() {
        let mut relay = MockRelay::new("local");
        let mut client = connected_client(&mut relay);

        client.stop(&mut relay);

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(
            client.drain_events(),
            vec![
                ClientEvent::StateChanged(ConnectionState::Disconnecting),
                ClientEvent::StateChanged(ConnectionState::Disconnected),
            ]
        );
        assert_eq!(relay.closed, vec![(PeerId::from("PUID-X"), SOCKET.to_string())]);
    }

    #[test]
    fn test_stop_when_disconnected_is_noop() {
        let mut relay = MockRelay::new("local");
        let mut client = ClientSession::new(SOCKET);

        client.stop(&mut relay);

        assert!(client.drain_events().is_empty());
        assert!(relay.closed.is_empty());
    }
}
