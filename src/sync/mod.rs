//! Local-first synchronization with the remote mirror.
//!
//! The coordinator owns the session's store and decides when local changes
//! propagate outward (debounced push) and how inbound snapshots apply
//! without triggering feedback loops. See [`coordinator::SyncCoordinator`].

mod coordinator;

pub use coordinator::SyncCoordinator;

use chrono::{DateTime, Utc};

/// Coordinator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Created, not yet bootstrapped.
    Uninitialized,
    /// Resolving the initial push/pull direction against the remote.
    Bootstrapping,
    /// Live: outbound debounce and inbound feed both running.
    Active,
    /// Sync disabled (logged out or bootstrap failed); local-only mode.
    Suspended,
}

/// Origin classification for a store mutation. Every mutation is
/// classified before the outbound-trigger check runs; remote-origin
/// mutations never re-trigger a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Local,
    Remote,
}

/// Session-scoped sync state. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    /// A push is pending (debounce armed) or in flight.
    pub is_syncing: bool,
    /// When the last successful push or inbound apply happened.
    pub last_synced_at: Option<DateTime<Utc>>,
}
