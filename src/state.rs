//! Per-link connection state
//!
//! Every link (the client's single outbound link, and each accepted peer on
//! the server side) carries one [`LinkStateCell`]. The cell deduplicates
//! repeated writes: only a transition to a different value is observable.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──connect──► Connecting ──accept ok──► Connected
//!      ▲                        │                         │
//!      │◄──────accept failed────┘                         │
//!      │                                                  ▼
//!      └────────close done──── Disconnecting ◄──────────stop
//! ```
//!
//! The accept-failure path goes straight back to `Disconnected`, skipping
//! `Disconnecting`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Connection State
// ============================================================================

/// State of a single link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No link established
    Disconnected,
    /// Link establishment in progress
    Connecting,
    /// Link is up
    Connected,
    /// Orderly teardown in progress
    Disconnecting,
}

// ============================================================================
// Link State Cell
// ============================================================================

/// Mutable state cell with change detection
///
/// `set` reports the new state only when it differs from the current one, so
/// the caller emits exactly one notification per actual transition, before
/// the triggering operation returns.
#[derive(Debug)]
pub struct LinkStateCell {
    state: ConnectionState,
}

impl LinkStateCell {
    /// Create a cell in the initial `Disconnected` state
    pub fn new() -> Self {
        LinkStateCell {
            state: ConnectionState::Disconnected,
        }
    }

    /// Current state
    pub fn get(&self) -> ConnectionState {
        self.state
    }

    /// Transition to `new`, reporting it if the value actually changed
    pub fn set(&mut self, new: ConnectionState) -> Option<ConnectionState> {
        if self.state == new {
            return None;
        }

        self.state = new;
        Some(new)
    }
}

impl Default for LinkStateCell {
    fn default() -> Self {
        LinkStateCell::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
