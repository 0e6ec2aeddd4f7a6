//! Delivery channels and their mapping onto relay reliability modes
//!
//! The networking stack above us tags every outbound send with a [`Channel`].
//! The relay only understands three reliability modes, so the four channels
//! collapse onto [`Reliability`] as follows:
//!
//! ```text
//! ┌──────────────────────┬─────────────────────┐
//! │ Channel              │ Reliability         │
//! ├──────────────────────┼─────────────────────┤
//! │ Unreliable           │ UnreliableUnordered │
//! │ UnreliableSequenced  │ UnreliableUnordered │
//! │ ReliableOrdered      │ ReliableOrdered     │
//! │ ReliableUnordered    │ ReliableUnordered   │
//! └──────────────────────┴─────────────────────┘
//! ```
//!
//! `UnreliableSequenced` has no distinct relay primitive and degrades to
//! plain unreliable delivery, so sequencing (drop-old ordering) is NOT
//! preserved on that channel. This is a known capability gap of the relay,
//! not a bug in the mapping.

use serde::{Deserialize, Serialize};

// ============================================================================
// Channel
// ============================================================================

/// Delivery semantics requested by the caller for an outbound send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    /// Fire and forget, no ordering
    Unreliable,
    /// Fire and forget, old packets dropped (degrades to `Unreliable`, see
    /// module docs)
    UnreliableSequenced,
    /// Delivered exactly once, in order
    ReliableOrdered,
    /// Delivered exactly once, any order
    ReliableUnordered,
}

// ============================================================================
// Reliability
// ============================================================================

/// Reliability mode understood by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reliability {
    /// No delivery or ordering guarantee
    UnreliableUnordered,
    /// Guaranteed delivery, in order
    ReliableOrdered,
    /// Guaranteed delivery, any order
    ReliableUnordered,
}

impl Channel {
    /// Map this channel onto the relay reliability mode that carries it
    pub fn reliability(self) -> Reliability {
        match self {
            Channel::Unreliable => Reliability::UnreliableUnordered,
            Channel::UnreliableSequenced => Reliability::UnreliableUnordered,
            Channel::ReliableOrdered => Reliability::ReliableOrdered,
            Channel::ReliableUnordered => Reliability::ReliableUnordered,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reliable_channels_keep_their_mode() {
        assert_eq!(
            Channel::ReliableOrdered.reliability(),
            Reliability::ReliableOrdered
        );
        assert_eq!(
            Channel::ReliableUnordered.reliability(),
            Reliability::ReliableUnordered
        );
    }

    #[test]
    fn test_unreliable_sequenced_degrades_to_unordered() {
        // The relay has no sequenced primitive; both unreliable channels
        // end up on the same mode.
        assert_eq!(
            Channel::UnreliableSequenced.reliability(),
            Reliability::UnreliableUnordered
        );
        assert_eq!(
            Channel::Unreliable.reliability(),
            Reliability::UnreliableUnordered
        );
    }
}
