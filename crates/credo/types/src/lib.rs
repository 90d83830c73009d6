//! Credo Types - Core vocabulary for the certificate authority
//!
//! Credo issues, verifies, and revokes non-transferable certificates. This
//! crate holds the shared vocabulary every other Credo crate speaks:
//!
//! - **Account** - an opaque, externally-authenticated caller identity
//! - **Role** - the closed permission tiers and their delegation table
//! - **Certificate** - an immutable-owner, revocable issuance record
//! - **Proposal** - a pending administrator request to mint a certificate
//! - **Events** - the notification envelope emitted after every mutation
//!
//! The crate is deliberately logic-free: registries and engines live in
//! `credo-roles`, `credo-ledger`, and `credo-proposals`.

#![deny(unsafe_code)]

pub mod account;
pub mod certificate;
pub mod events;
pub mod proposal;
pub mod role;

pub use account::Account;
pub use certificate::{Certificate, CertificateId};
pub use events::{CredoEvent, EventEnvelope, EventSeverity};
pub use proposal::{Proposal, ProposalId, ProposalStatus};
pub use role::Role;
