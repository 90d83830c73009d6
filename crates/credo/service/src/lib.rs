//! Credo Service - the certificate authority facade
//!
//! Binds the Credo core together behind one method-call surface:
//!
//! - **CertificateAuthority** - owns the role registry, the certificate
//!   ledger, the proposal engine, the pause switch, and the event bus
//! - **EventBus** - broadcast stream carrying exactly one event per
//!   successful mutation, none on failure
//! - **CredoError** - aggregation of the component errors, classified
//!   into kinds for boundary layers
//!
//! Mutations take `&mut self`: the facade is a single-writer state
//! machine, and callers that need cross-thread access wrap it in their
//! own mutex or actor. Every mutation either commits completely or
//! reports an error with no observable partial effect.

#![deny(unsafe_code)]

pub mod authority;
pub mod bus;
pub mod config;
pub mod error;

pub use authority::CertificateAuthority;
pub use bus::EventBus;
pub use config::AuthorityConfig;
pub use error::{CredoError, ErrorKind};

// Component types surfaced through the facade API.
pub use credo_ledger::{LedgerError, LedgerStats};
pub use credo_proposals::{ApprovalOutcome, ProposalError};
pub use credo_roles::{EmergencyRevocation, RoleError, RoleRequest};
