//! Event types for the Credo notification stream.
//!
//! Every successful mutation emits exactly one event so external observers
//! (an indexer, a dashboard) can reconstruct state without polling. Failed
//! calls emit nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::Account;
use crate::certificate::CertificateId;
use crate::proposal::ProposalId;
use crate::role::Role;

/// Envelope wrapping every Credo event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Event severity
    pub severity: EventSeverity,

    /// Account that triggered the mutation
    pub actor: Account,

    /// The actual event
    pub event: CredoEvent,
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Informational event
    Info,
    /// Warning event (revocations, cancellations)
    Warning,
    /// Critical event requiring operator attention
    Critical,
}

/// Credo events, one variant per mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredoEvent {
    // ═══════════════════════════════════════════════════════════════════
    // ROLE HIERARCHY EVENTS
    // ═══════════════════════════════════════════════════════════════════
    /// A role was granted through the delegation path
    RoleGranted {
        role: Role,
        account: Account,
    },

    /// A role was revoked through the delegation path
    RoleRevoked {
        role: Role,
        account: Account,
    },

    /// A role was stripped outside the delegation path
    EmergencyRoleRevoked {
        role: Role,
        account: Account,
        reason: String,
    },

    /// An account asked for a role; review is a manual process
    RoleRequested {
        role: Role,
        justification: String,
    },

    /// A batch of roles was granted in one call
    RolesBatchGranted {
        granted: usize,
        skipped: usize,
    },

    // ═══════════════════════════════════════════════════════════════════
    // CERTIFICATE EVENTS
    // ═══════════════════════════════════════════════════════════════════
    /// A certificate was minted
    CertificateMinted {
        certificate_id: CertificateId,
        recipient: Account,
    },

    /// A certificate was revoked; ownership is unchanged
    CertificateRevoked {
        certificate_id: CertificateId,
    },

    // ═══════════════════════════════════════════════════════════════════
    // PROPOSAL EVENTS
    // ═══════════════════════════════════════════════════════════════════
    /// An issuance proposal was created
    ProposalCreated {
        proposal_id: ProposalId,
        recipient: Account,
    },

    /// An approval was recorded without reaching the threshold
    ProposalApproved {
        proposal_id: ProposalId,
        approvals: u32,
    },

    /// A previously recorded approval was withdrawn
    ApprovalRevoked {
        proposal_id: ProposalId,
        approvals: u32,
    },

    /// The proposal reached its threshold and minted its certificate
    ProposalExecuted {
        proposal_id: ProposalId,
        certificate_id: CertificateId,
    },

    /// The proposal was cancelled before execution
    ProposalCancelled {
        proposal_id: ProposalId,
    },

    /// The global approval threshold changed
    ThresholdChanged {
        previous: u32,
        current: u32,
    },

    // ═══════════════════════════════════════════════════════════════════
    // EMERGENCY CONTROL EVENTS
    // ═══════════════════════════════════════════════════════════════════
    /// Certificate and proposal mutations are suspended
    Paused,

    /// Normal operation resumed
    Unpaused,
}
