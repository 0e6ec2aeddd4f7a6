//! In-memory relay for unit tests
//!
//! Deterministic stand-in for the real relay SDK binding: every call is
//! recorded, inbound packets are scripted, and failure modes are toggled by
//! flags. `queue_late_packet` stages packets that only become visible after
//! a receive, which is how the drain-cap behavior (queue depth sampled once
//! per tick) gets exercised.

use std::collections::VecDeque;

use crate::channel::Reliability;
use crate::session::{InboundPacket, PeerId, RelaySession};

/// One packet handed to [`RelaySession::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub remote: PeerId,
    pub socket: String,
    pub data: Vec<u8>,
    pub reliability: Reliability,
}

/// Scripted, recording relay session
#[derive(Debug, Default)]
pub struct MockRelay {
    pub local: Option<PeerId>,
    pub inbound: VecDeque<InboundPacket>,
    /// Packets that arrive while a drain is in progress
    late: VecDeque<InboundPacket>,
    pub sent: Vec<SentPacket>,
    pub accepted: Vec<(PeerId, String)>,
    pub closed: Vec<(PeerId, String)>,
    pub refuse_accept: bool,
    pub refuse_send: bool,
}

impl MockRelay {
    pub fn new(local: &str) -> Self {
        MockRelay {
            local: Some(PeerId::from(local)),
            ..Default::default()
        }
    }

    /// Relay whose platform session is not ready
    pub fn without_identity() -> Self {
        MockRelay::default()
    }

    pub fn queue_packet(&mut self, sender: &str, socket: &str, data: Vec<u8>) {
        self.inbound.push_back(InboundPacket {
            sender: PeerId::from(sender),
            socket: socket.to_string(),
            data,
            channel: 0,
        });
    }

    /// Stage a packet that joins the queue after the next receive
    pub fn queue_late_packet(&mut self, sender: &str, socket: &str, data: Vec<u8>) {
        self.late.push_back(InboundPacket {
            sender: PeerId::from(sender),
            socket: socket.to_string(),
            data,
            channel: 0,
        });
    }
}

impl RelaySession for MockRelay {
    fn local_peer(&self) -> Option<PeerId> {
        self.local.clone()
    }

    fn accept(&mut self, _local: &PeerId, remote: &PeerId, socket: &str) -> bool {
        if self.refuse_accept {
            return false;
        }
        self.accepted.push((remote.clone(), socket.to_string()));
        true
    }

    fn close(&mut self, _local: &PeerId, remote: &PeerId, socket: &str) {
        self.closed.push((remote.clone(), socket.to_string()));
    }

    fn send(
        &mut self,
        _local: &PeerId,
        remote: &PeerId,
        socket: &str,
        data: &[u8],
        reliability: Reliability,
    ) -> bool {
        if self.refuse_send {
            return false;
        }
        self.sent.push(SentPacket {
            remote: remote.clone(),
            socket: socket.to_string(),
            data: data.to_vec(),
            reliability,
        });
        true
    }

    fn queued_packet_count(&mut self, _local: &PeerId) -> usize {
        self.inbound.len()
    }

    fn receive_one(&mut self, _local: &PeerId) -> Option<InboundPacket> {
        let packet = self.inbound.pop_front()?;
        if let Some(late) = self.late.pop_front() {
            self.inbound.push_back(late);
        }
        Some(packet)
    }
}
