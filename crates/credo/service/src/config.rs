//! Service configuration.

/// Default number of distinct non-proposer approvals required to execute
/// an issuance proposal.
pub const DEFAULT_APPROVAL_THRESHOLD: u32 = 2;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Configuration for a [`crate::CertificateAuthority`].
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    /// Initial approval threshold for the proposal engine. Must be at
    /// least 1; `SuperAdmin` can change it at runtime.
    pub approval_threshold: u32,

    /// Capacity of the event broadcast channel. Slow subscribers that
    /// fall further behind than this lose the oldest events.
    pub event_capacity: usize,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
