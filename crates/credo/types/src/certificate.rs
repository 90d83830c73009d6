//! Certificate records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Account;

/// Sequential certificate identifier. Ids are assigned monotonically by
/// the ledger and are never reused, not even after revocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CertificateId(pub u64);

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An issued certificate.
///
/// The owner is fixed at mint time for the lifetime of the record; no
/// operation transfers it. The revoked flag moves false to true exactly
/// once and never back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub owner: Account,
    /// Opaque metadata reference; resolution to content is the storage
    /// collaborator's job.
    pub metadata_ref: String,
    pub issued_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Certificate {
    pub fn is_active(&self) -> bool {
        !self.revoked
    }
}
