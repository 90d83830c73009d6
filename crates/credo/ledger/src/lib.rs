//! Credo Ledger - the certificate ledger
//!
//! Owns certificate records: issuance, one-way revocation, and queries.
//! Certificates are soulbound; the owner recorded at mint time never
//! changes and every transfer attempt is rejected outright.
//!
//! Ids are assigned from a monotonically increasing counter and are never
//! reused, not even after revocation. Every mutation is validate-then-
//! commit: a failed call leaves the ledger exactly as it was.
//!
//! Permission checks consult the `credo-roles` registry. Direct minting is
//! for `SuperAdmin` and `Issuer`; an `Admin` must route through the
//! proposal engine, which calls the permission-free [`CertificateLedger::issue`]
//! primitive once its threshold is met.

#![deny(unsafe_code)]

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use credo_roles::RoleRegistry;
use credo_types::{Account, Certificate, CertificateId, Role};

/// The certificate ledger.
pub struct CertificateLedger {
    /// Certificate records by id (never removed)
    certificates: BTreeMap<CertificateId, Certificate>,
    /// Ids held per owner, in mint order
    owner_index: HashMap<Account, Vec<CertificateId>>,
    /// Next certificate id
    next_id: u64,
    /// Count of revoked certificates
    total_revoked: u64,
}

/// Aggregate counters over the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_minted: u64,
    pub total_revoked: u64,
    pub active: u64,
}

/// Errors from the certificate ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{caller} is not authorized to mint certificates")]
    MintNotAuthorized { caller: Account },

    #[error("{caller} holds ADMIN and must mint through the proposal workflow")]
    AdminDirectMint { caller: Account },

    #[error("{caller} is not authorized to revoke certificates")]
    RevokeNotAuthorized { caller: Account },

    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    #[error("certificate {0} is already revoked")]
    AlreadyRevoked(CertificateId),

    #[error("recipient account id must not be empty")]
    EmptyRecipient,

    #[error("metadata reference must not be empty")]
    EmptyMetadata,

    #[error("certificates are non-transferable")]
    NonTransferable,
}

impl CertificateLedger {
    pub fn new() -> Self {
        Self {
            certificates: BTreeMap::new(),
            owner_index: HashMap::new(),
            next_id: 1,
            total_revoked: 0,
        }
    }

    /// Mint a certificate directly.
    ///
    /// Permitted for `SuperAdmin` and `Issuer`. An `Admin` is rejected
    /// even when it also holds `Issuer`: administrators mint through the
    /// proposal workflow only.
    pub fn mint(
        &mut self,
        roles: &RoleRegistry,
        caller: &Account,
        recipient: &Account,
        metadata_ref: &str,
    ) -> Result<CertificateId, LedgerError> {
        if !roles.has_role(caller, Role::SuperAdmin) {
            if roles.has_role(caller, Role::Admin) {
                return Err(LedgerError::AdminDirectMint {
                    caller: caller.clone(),
                });
            }
            if !roles.has_role(caller, Role::Issuer) {
                return Err(LedgerError::MintNotAuthorized {
                    caller: caller.clone(),
                });
            }
        }

        self.issue(recipient, metadata_ref)
    }

    /// The issuance primitive: assign the next id and record the
    /// certificate.
    ///
    /// Carries no permission check; callers authorize first. The proposal
    /// engine invokes this after its approval threshold is met, `mint`
    /// after its own role check. Recipient and metadata are still
    /// validated here so no path can record a malformed certificate.
    pub fn issue(
        &mut self,
        recipient: &Account,
        metadata_ref: &str,
    ) -> Result<CertificateId, LedgerError> {
        if !recipient.is_valid() {
            return Err(LedgerError::EmptyRecipient);
        }
        if metadata_ref.trim().is_empty() {
            return Err(LedgerError::EmptyMetadata);
        }

        let id = CertificateId(self.next_id);
        self.next_id += 1;

        self.certificates.insert(
            id,
            Certificate {
                id,
                owner: recipient.clone(),
                metadata_ref: metadata_ref.to_string(),
                issued_at: Utc::now(),
                revoked: false,
            },
        );
        self.owner_index
            .entry(recipient.clone())
            .or_default()
            .push(id);

        info!(certificate = %id, owner = %recipient, "certificate issued");
        Ok(id)
    }

    /// Revoke a certificate. `SuperAdmin`-only; one-way.
    ///
    /// Only the revoked flag changes; the owner and the record itself
    /// stay in place for audit.
    pub fn revoke(
        &mut self,
        roles: &RoleRegistry,
        caller: &Account,
        id: CertificateId,
    ) -> Result<(), LedgerError> {
        if !roles.can_revoke(caller) {
            return Err(LedgerError::RevokeNotAuthorized {
                caller: caller.clone(),
            });
        }

        let certificate = self
            .certificates
            .get_mut(&id)
            .ok_or(LedgerError::NotFound(id))?;
        if certificate.revoked {
            return Err(LedgerError::AlreadyRevoked(id));
        }

        certificate.revoked = true;
        self.total_revoked += 1;

        warn!(certificate = %id, revoked_by = %caller, "certificate revoked");
        Ok(())
    }

    /// True iff the certificate exists and is not revoked.
    pub fn verify(&self, id: CertificateId) -> bool {
        self.certificates
            .get(&id)
            .map(Certificate::is_active)
            .unwrap_or(false)
    }

    /// Full record lookup.
    pub fn get(&self, id: CertificateId) -> Result<&Certificate, LedgerError> {
        self.certificates.get(&id).ok_or(LedgerError::NotFound(id))
    }

    /// Transfers do not exist for soulbound certificates; every attempt
    /// is rejected, for every certificate, under every role.
    pub fn transfer(
        &self,
        _caller: &Account,
        _to: &Account,
        _id: CertificateId,
    ) -> Result<(), LedgerError> {
        Err(LedgerError::NonTransferable)
    }

    /// Ids owned by `account`, in mint order. Revoked certificates stay
    /// listed; revocation does not change ownership.
    pub fn certificates_of(&self, account: &Account) -> Vec<CertificateId> {
        self.owner_index
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_minted(&self) -> u64 {
        self.certificates.len() as u64
    }

    pub fn total_revoked(&self) -> u64 {
        self.total_revoked
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            total_minted: self.total_minted(),
            total_revoked: self.total_revoked,
            active: self.total_minted() - self.total_revoked,
        }
    }
}

impl Default for CertificateLedger {
    fn default() -> Self {
        Self::new()
    }
}
