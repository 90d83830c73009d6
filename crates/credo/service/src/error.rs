//! Service-level error aggregation.

use thiserror::Error;

use credo_ledger::LedgerError;
use credo_proposals::ProposalError;
use credo_roles::RoleError;

/// Errors surfaced by the authority facade.
///
/// Component errors pass through verbatim; the facade adds only the
/// pause-related variants it owns itself.
#[derive(Debug, Error)]
pub enum CredoError {
    #[error("system is paused")]
    Paused,

    #[error("system is already paused")]
    AlreadyPaused,

    #[error("system is not paused")]
    NotPaused,

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Proposal(#[from] ProposalError),
}

/// Coarse classification of an error for boundary layers (HTTP glue, a
/// CLI) that map kinds to status codes or exit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A role or permission check failed
    Authorization,
    /// A certificate or proposal id does not exist
    NotFound,
    /// The operation conflicts with current state (double approval,
    /// re-revocation, terminal proposal, protected role)
    InvalidState,
    /// An argument was malformed (empty identity, empty metadata,
    /// mismatched batch lengths, non-positive threshold)
    Validation,
    /// The mutation was attempted while the system is paused
    Paused,
}

impl CredoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CredoError::Paused => ErrorKind::Paused,
            CredoError::AlreadyPaused | CredoError::NotPaused => ErrorKind::InvalidState,
            CredoError::Role(err) => role_kind(err),
            CredoError::Ledger(err) => ledger_kind(err),
            CredoError::Proposal(err) => proposal_kind(err),
        }
    }
}

fn role_kind(err: &RoleError) -> ErrorKind {
    match err {
        RoleError::NotAuthorized { .. } => ErrorKind::Authorization,
        RoleError::ProtectedRole(_)
        | RoleError::AlreadyGranted { .. }
        | RoleError::NotGranted { .. } => ErrorKind::InvalidState,
        RoleError::JustificationRequired
        | RoleError::BatchLengthMismatch { .. }
        | RoleError::InvalidAccount => ErrorKind::Validation,
    }
}

fn ledger_kind(err: &LedgerError) -> ErrorKind {
    match err {
        LedgerError::MintNotAuthorized { .. }
        | LedgerError::AdminDirectMint { .. }
        | LedgerError::RevokeNotAuthorized { .. } => ErrorKind::Authorization,
        LedgerError::NotFound(_) => ErrorKind::NotFound,
        LedgerError::AlreadyRevoked(_) | LedgerError::NonTransferable => ErrorKind::InvalidState,
        LedgerError::EmptyRecipient | LedgerError::EmptyMetadata => ErrorKind::Validation,
    }
}

fn proposal_kind(err: &ProposalError) -> ErrorKind {
    match err {
        ProposalError::NotAuthorized { .. } => ErrorKind::Authorization,
        ProposalError::NotFound(_) => ErrorKind::NotFound,
        ProposalError::SelfApproval
        | ProposalError::AlreadyApproved { .. }
        | ProposalError::ApprovalNotFound { .. }
        | ProposalError::Terminal { .. }
        | ProposalError::BelowThreshold { .. } => ErrorKind::InvalidState,
        ProposalError::InvalidThreshold(_) => ErrorKind::Validation,
        ProposalError::Ledger(inner) => ledger_kind(inner),
    }
}
