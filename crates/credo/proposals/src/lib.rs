//! Credo Proposals - the multi-signature proposal engine
//!
//! Administrators cannot mint certificates directly; they propose, and
//! enough of their peers must agree. This crate owns the proposal
//! lifecycle (Pending, then Executed or Cancelled, both terminal) and the
//! approval bookkeeping: approvals are unique, ordered by call, never
//! include the proposer, and the approval that reaches the global
//! threshold mints the certificate in the same call.
//!
//! Execution is funneled through one private routine shared by the
//! threshold path and the manual fallback, so a proposal can execute at
//! most once no matter how the threshold moves after creation.

#![deny(unsafe_code)]

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use credo_ledger::{CertificateLedger, LedgerError};
use credo_roles::RoleRegistry;
use credo_types::{Account, CertificateId, Proposal, ProposalId, ProposalStatus, Role};

/// The proposal engine.
pub struct ProposalEngine {
    /// Proposals by id (terminal proposals are kept for query)
    proposals: BTreeMap<ProposalId, Proposal>,
    /// Next proposal id
    next_id: u64,
    /// Distinct non-proposer approvals required for execution
    threshold: u32,
}

/// What an approval call did: the resulting approval count, and the
/// certificate minted when this approval reached the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub approvals: u32,
    pub executed: Option<CertificateId>,
}

/// Errors from the proposal engine.
#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("{caller} is not authorized to {action}")]
    NotAuthorized { caller: Account, action: String },

    #[error("proposal {0} not found")]
    NotFound(ProposalId),

    #[error("cannot approve your own proposal")]
    SelfApproval,

    #[error("{account} has already approved proposal {id}")]
    AlreadyApproved { id: ProposalId, account: Account },

    #[error("{account} has no approval to withdraw on proposal {id}")]
    ApprovalNotFound { id: ProposalId, account: Account },

    #[error("proposal {id} is {status:?} and can no longer change")]
    Terminal {
        id: ProposalId,
        status: ProposalStatus,
    },

    #[error("proposal {id} has {approvals} of {required} required approvals")]
    BelowThreshold {
        id: ProposalId,
        approvals: u32,
        required: u32,
    },

    #[error("approval threshold must be at least 1, got {0}")]
    InvalidThreshold(u32),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ProposalEngine {
    /// Create an engine with the given approval threshold.
    pub fn new(threshold: u32) -> Result<Self, ProposalError> {
        if threshold < 1 {
            return Err(ProposalError::InvalidThreshold(threshold));
        }
        Ok(Self {
            proposals: BTreeMap::new(),
            next_id: 1,
            threshold,
        })
    }

    /// Create a pending proposal to mint a certificate for `recipient`.
    ///
    /// Caller must be `Admin` or `SuperAdmin`. Recipient and metadata are
    /// validated now so execution can never fail later; the proposer is
    /// not added to the approval list.
    pub fn create(
        &mut self,
        roles: &RoleRegistry,
        caller: &Account,
        recipient: &Account,
        title: &str,
        description: &str,
        metadata_ref: &str,
    ) -> Result<ProposalId, ProposalError> {
        if !roles.is_admin(caller) {
            return Err(ProposalError::NotAuthorized {
                caller: caller.clone(),
                action: "create proposals".to_string(),
            });
        }
        if !recipient.is_valid() {
            return Err(LedgerError::EmptyRecipient.into());
        }
        if metadata_ref.trim().is_empty() {
            return Err(LedgerError::EmptyMetadata.into());
        }

        let id = ProposalId(self.next_id);
        self.next_id += 1;

        self.proposals.insert(
            id,
            Proposal {
                id,
                proposer: caller.clone(),
                recipient: recipient.clone(),
                title: title.to_string(),
                description: description.to_string(),
                metadata_ref: metadata_ref.to_string(),
                approvals: Vec::new(),
                executed: false,
                certificate_id: None,
                cancelled: false,
                created_at: Utc::now(),
            },
        );

        info!(proposal = %id, proposer = %caller, recipient = %recipient, "proposal created");
        Ok(id)
    }

    /// Record an approval; execute when it reaches the threshold.
    ///
    /// Caller must be `Admin` or `SuperAdmin`, must not be the proposer,
    /// and must not already be in the approval list. When the new count
    /// reaches the threshold the certificate is issued and the proposal
    /// marked Executed within this same call; there is no observable
    /// approved-but-not-executed state.
    pub fn approve(
        &mut self,
        roles: &RoleRegistry,
        ledger: &mut CertificateLedger,
        caller: &Account,
        id: ProposalId,
    ) -> Result<ApprovalOutcome, ProposalError> {
        if !roles.is_admin(caller) {
            return Err(ProposalError::NotAuthorized {
                caller: caller.clone(),
                action: "approve proposals".to_string(),
            });
        }

        let threshold = self.threshold;
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(ProposalError::NotFound(id))?;

        ensure_pending(proposal)?;
        if proposal.proposer == *caller {
            return Err(ProposalError::SelfApproval);
        }
        if proposal.has_approved(caller) {
            return Err(ProposalError::AlreadyApproved {
                id,
                account: caller.clone(),
            });
        }

        proposal.approvals.push(caller.clone());
        let approvals = proposal.approval_count();

        let executed = if approvals >= threshold {
            match execute_pending(proposal, ledger) {
                Ok(certificate_id) => Some(certificate_id),
                Err(err) => {
                    // Roll back the approval so a failed execution leaves
                    // no partial effect.
                    proposal.approvals.pop();
                    return Err(err);
                }
            }
        } else {
            info!(proposal = %id, approver = %caller, approvals, threshold, "proposal approved");
            None
        };

        Ok(ApprovalOutcome { approvals, executed })
    }

    /// Withdraw a previously recorded approval. The caller may approve
    /// again later.
    pub fn revoke_approval(
        &mut self,
        caller: &Account,
        id: ProposalId,
    ) -> Result<u32, ProposalError> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(ProposalError::NotFound(id))?;

        ensure_pending(proposal)?;
        let position = proposal
            .approvals
            .iter()
            .position(|account| account == caller)
            .ok_or_else(|| ProposalError::ApprovalNotFound {
                id,
                account: caller.clone(),
            })?;

        proposal.approvals.remove(position);
        let approvals = proposal.approval_count();

        info!(proposal = %id, approver = %caller, approvals, "approval withdrawn");
        Ok(approvals)
    }

    /// Manual execution fallback for proposals whose collected approvals
    /// already meet the threshold, e.g. after the threshold was lowered.
    ///
    /// Shares the execution routine with the approval path, so at most
    /// one execution can ever occur for a given proposal.
    pub fn execute(
        &mut self,
        roles: &RoleRegistry,
        ledger: &mut CertificateLedger,
        caller: &Account,
        id: ProposalId,
    ) -> Result<CertificateId, ProposalError> {
        if !roles.is_admin(caller) {
            return Err(ProposalError::NotAuthorized {
                caller: caller.clone(),
                action: "execute proposals".to_string(),
            });
        }

        let threshold = self.threshold;
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(ProposalError::NotFound(id))?;

        ensure_pending(proposal)?;
        let approvals = proposal.approval_count();
        if approvals < threshold {
            return Err(ProposalError::BelowThreshold {
                id,
                approvals,
                required: threshold,
            });
        }

        execute_pending(proposal, ledger)
    }

    /// Cancel a pending proposal. `SuperAdmin`-only; terminal.
    pub fn cancel(
        &mut self,
        roles: &RoleRegistry,
        caller: &Account,
        id: ProposalId,
    ) -> Result<(), ProposalError> {
        if !roles.has_role(caller, Role::SuperAdmin) {
            return Err(ProposalError::NotAuthorized {
                caller: caller.clone(),
                action: "cancel proposals".to_string(),
            });
        }

        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(ProposalError::NotFound(id))?;

        ensure_pending(proposal)?;
        proposal.cancelled = true;

        warn!(proposal = %id, cancelled_by = %caller, "proposal cancelled");
        Ok(())
    }

    /// Change the global approval threshold. `SuperAdmin`-only; must be
    /// at least 1. Applies to every pending proposal immediately; already
    /// collected approvals become executable through [`ProposalEngine::execute`]
    /// if the new threshold is lower. Returns the previous threshold.
    pub fn set_threshold(
        &mut self,
        roles: &RoleRegistry,
        caller: &Account,
        threshold: u32,
    ) -> Result<u32, ProposalError> {
        if !roles.has_role(caller, Role::SuperAdmin) {
            return Err(ProposalError::NotAuthorized {
                caller: caller.clone(),
                action: "change the approval threshold".to_string(),
            });
        }
        if threshold < 1 {
            return Err(ProposalError::InvalidThreshold(threshold));
        }

        let previous = self.threshold;
        self.threshold = threshold;

        info!(previous, current = threshold, changed_by = %caller, "approval threshold changed");
        Ok(previous)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn get(&self, id: ProposalId) -> Result<&Proposal, ProposalError> {
        self.proposals.get(&id).ok_or(ProposalError::NotFound(id))
    }

    /// Every proposal id ever created, ascending.
    pub fn all_ids(&self) -> Vec<ProposalId> {
        self.proposals.keys().copied().collect()
    }

    /// Pending proposals only, ascending by id.
    pub fn pending(&self) -> Vec<&Proposal> {
        self.proposals
            .values()
            .filter(|proposal| proposal.is_pending())
            .collect()
    }

    pub fn has_approved(&self, id: ProposalId, account: &Account) -> Result<bool, ProposalError> {
        Ok(self.get(id)?.has_approved(account))
    }

    pub fn approvers(&self, id: ProposalId) -> Result<&[Account], ProposalError> {
        Ok(&self.get(id)?.approvals)
    }
}

fn ensure_pending(proposal: &Proposal) -> Result<(), ProposalError> {
    match proposal.status() {
        ProposalStatus::Pending => Ok(()),
        status => Err(ProposalError::Terminal {
            id: proposal.id,
            status,
        }),
    }
}

/// Issue the certificate for a pending proposal and mark it Executed.
///
/// Both execution paths (the threshold-reaching approval and the manual
/// fallback) funnel through here after their own validation; the issue
/// happens before the flags flip so a ledger rejection leaves the
/// proposal pending and unmodified.
fn execute_pending(
    proposal: &mut Proposal,
    ledger: &mut CertificateLedger,
) -> Result<CertificateId, ProposalError> {
    let certificate_id = ledger.issue(&proposal.recipient, &proposal.metadata_ref)?;
    proposal.executed = true;
    proposal.certificate_id = Some(certificate_id);

    info!(
        proposal = %proposal.id,
        certificate = %certificate_id,
        recipient = %proposal.recipient,
        "proposal executed"
    );
    Ok(certificate_id)
}
