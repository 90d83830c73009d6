//! Issuance proposals and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::certificate::CertificateId;

/// Sequential proposal identifier, assigned monotonically by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub u64);

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a proposal. `Executed` and `Cancelled` are terminal:
/// once reached, no further mutation of the proposal is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Executed,
    Cancelled,
}

/// A pending administrator request to mint a certificate.
///
/// Approvals are kept in call order; the list never contains duplicates
/// and never contains the proposer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Account,
    pub recipient: Account,
    pub title: String,
    pub description: String,
    /// Opaque metadata reference forwarded verbatim to the ledger on
    /// execution.
    pub metadata_ref: String,
    pub approvals: Vec<Account>,
    pub executed: bool,
    /// Certificate minted by execution, once `executed` is true.
    pub certificate_id: Option<CertificateId>,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    pub fn status(&self) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if self.cancelled {
            ProposalStatus::Cancelled
        } else {
            ProposalStatus::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == ProposalStatus::Pending
    }

    pub fn approval_count(&self) -> u32 {
        self.approvals.len() as u32
    }

    pub fn has_approved(&self, account: &Account) -> bool {
        self.approvals.iter().any(|a| a == account)
    }
}
