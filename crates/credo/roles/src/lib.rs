//! Credo Roles - the Role Hierarchy Manager
//!
//! Owns role membership and enforces the delegation graph: which role may
//! grant or revoke which other role. Everything above this crate (the
//! ledger, the proposal engine, the service facade) asks the registry
//! before mutating anything.
//!
//! Authorization follows a static delegation table (`Role::administered_by`)
//! plus one hard-coded override: `SuperAdmin` may administer every
//! non-protected role directly. `Root` and `SuperAdmin` are protected;
//! `Root` is seeded at bootstrap and never moves, `SuperAdmin` moves only
//! by `Root`'s hand.

#![deny(unsafe_code)]

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use credo_types::{Account, Role};

/// Role membership registry with delegation-checked mutation.
///
/// Memberships are the single source of truth; call-site layers that want
/// idempotent-skip semantics (the batch path does) query membership first
/// rather than swallowing errors here.
pub struct RoleRegistry {
    /// Role memberships per account
    memberships: HashMap<Account, BTreeSet<Role>>,
    /// Emergency revocation history (append-only)
    emergency_revocations: Vec<EmergencyRevocation>,
    /// Role request history (append-only; review is manual)
    role_requests: Vec<RoleRequest>,
}

/// Record of a role stripped outside the normal delegation path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmergencyRevocation {
    pub account: Account,
    pub role: Role,
    pub reason: String,
    pub revoked_by: Account,
    pub revoked_at: DateTime<Utc>,
}

/// Record of an account asking for a role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleRequest {
    pub account: Account,
    pub role: Role,
    pub justification: String,
    pub requested_at: DateTime<Utc>,
}

/// Errors from the Role Hierarchy Manager.
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("{caller} is not authorized to {action}")]
    NotAuthorized { caller: Account, action: String },

    #[error("{0} is protected and cannot be moved by this operation")]
    ProtectedRole(Role),

    #[error("{account} already holds {role}")]
    AlreadyGranted { account: Account, role: Role },

    #[error("{account} does not hold {role}")]
    NotGranted { account: Account, role: Role },

    #[error("a non-empty justification is required")]
    JustificationRequired,

    #[error("batch arrays differ in length: {accounts} accounts, {roles} roles")]
    BatchLengthMismatch { accounts: usize, roles: usize },

    #[error("account id must not be empty")]
    InvalidAccount,
}

impl RoleRegistry {
    /// Create an empty registry with no memberships at all.
    pub fn new() -> Self {
        Self {
            memberships: HashMap::new(),
            emergency_revocations: Vec::new(),
            role_requests: Vec::new(),
        }
    }

    /// Create a registry seeded with the deploying identity.
    ///
    /// The deployer receives `Root` and `SuperAdmin`; without that seed no
    /// identity could administer anything.
    pub fn bootstrap(deployer: &Account) -> Result<Self, RoleError> {
        if !deployer.is_valid() {
            return Err(RoleError::InvalidAccount);
        }

        let mut registry = Self::new();
        let roles = registry.memberships.entry(deployer.clone()).or_default();
        roles.insert(Role::Root);
        roles.insert(Role::SuperAdmin);

        info!(account = %deployer, "registry bootstrapped");
        Ok(registry)
    }

    /// Whether `caller` may grant or revoke `role` through the ordinary
    /// delegation path.
    fn can_administer(&self, caller: &Account, role: Role) -> bool {
        if let Some(administrator) = role.administered_by() {
            if self.has_role(caller, administrator) {
                return true;
            }
        }
        // SuperAdmin override: every non-protected role, directly.
        !role.is_protected() && self.has_role(caller, Role::SuperAdmin)
    }

    /// Grant `role` to `account`.
    ///
    /// The caller must administer `role` per the delegation table
    /// (including the SuperAdmin override). Granting `Root` always fails;
    /// granting a role the account already holds fails so call sites see
    /// true membership.
    pub fn grant_role(
        &mut self,
        caller: &Account,
        role: Role,
        account: &Account,
    ) -> Result<(), RoleError> {
        if !account.is_valid() {
            return Err(RoleError::InvalidAccount);
        }
        if role == Role::Root {
            return Err(RoleError::ProtectedRole(Role::Root));
        }
        if !self.can_administer(caller, role) {
            return Err(RoleError::NotAuthorized {
                caller: caller.clone(),
                action: format!("grant {role}"),
            });
        }
        if self.has_role(account, role) {
            return Err(RoleError::AlreadyGranted {
                account: account.clone(),
                role,
            });
        }

        self.memberships
            .entry(account.clone())
            .or_default()
            .insert(role);

        info!(account = %account, role = %role, granted_by = %caller, "role granted");
        Ok(())
    }

    /// Revoke `role` from `account` through the delegation path.
    pub fn revoke_role(
        &mut self,
        caller: &Account,
        role: Role,
        account: &Account,
    ) -> Result<(), RoleError> {
        if role == Role::Root {
            return Err(RoleError::ProtectedRole(Role::Root));
        }
        if !self.can_administer(caller, role) {
            return Err(RoleError::NotAuthorized {
                caller: caller.clone(),
                action: format!("revoke {role}"),
            });
        }
        if !self.has_role(account, role) {
            return Err(RoleError::NotGranted {
                account: account.clone(),
                role,
            });
        }

        if let Some(roles) = self.memberships.get_mut(account) {
            roles.remove(&role);
        }

        warn!(account = %account, role = %role, revoked_by = %caller, "role revoked");
        Ok(())
    }

    /// Strip `role` from `account` outside the delegation path.
    ///
    /// `SuperAdmin`-only. Protected roles cannot be stripped this way.
    /// The mandatory reason is appended to the emergency history.
    pub fn emergency_revoke_role(
        &mut self,
        caller: &Account,
        account: &Account,
        role: Role,
        reason: &str,
    ) -> Result<(), RoleError> {
        if !self.has_role(caller, Role::SuperAdmin) {
            return Err(RoleError::NotAuthorized {
                caller: caller.clone(),
                action: format!("emergency-revoke {role}"),
            });
        }
        if role.is_protected() {
            return Err(RoleError::ProtectedRole(role));
        }
        if reason.trim().is_empty() {
            return Err(RoleError::JustificationRequired);
        }
        if !self.has_role(account, role) {
            return Err(RoleError::NotGranted {
                account: account.clone(),
                role,
            });
        }

        if let Some(roles) = self.memberships.get_mut(account) {
            roles.remove(&role);
        }

        self.emergency_revocations.push(EmergencyRevocation {
            account: account.clone(),
            role,
            reason: reason.to_string(),
            revoked_by: caller.clone(),
            revoked_at: Utc::now(),
        });

        warn!(
            account = %account,
            role = %role,
            revoked_by = %caller,
            reason = %reason,
            "emergency role revocation"
        );
        Ok(())
    }

    /// Record a role request. No membership changes; review is a manual,
    /// out-of-band process.
    pub fn request_role(
        &mut self,
        caller: &Account,
        role: Role,
        justification: &str,
    ) -> Result<(), RoleError> {
        if !caller.is_valid() {
            return Err(RoleError::InvalidAccount);
        }
        if role.is_protected() {
            return Err(RoleError::ProtectedRole(role));
        }
        if self.has_role(caller, role) {
            return Err(RoleError::AlreadyGranted {
                account: caller.clone(),
                role,
            });
        }
        if justification.trim().is_empty() {
            return Err(RoleError::JustificationRequired);
        }

        self.role_requests.push(RoleRequest {
            account: caller.clone(),
            role,
            justification: justification.to_string(),
            requested_at: Utc::now(),
        });

        info!(account = %caller, role = %role, "role requested");
        Ok(())
    }

    /// Grant `roles[i]` to `accounts[i]` for every i, in one call.
    ///
    /// `SuperAdmin`-only. The whole batch is validated before the first
    /// grant so a failure leaves membership untouched. Roles already held
    /// are skipped. Returns the number of grants actually applied.
    pub fn batch_grant_roles(
        &mut self,
        caller: &Account,
        accounts: &[Account],
        roles: &[Role],
    ) -> Result<usize, RoleError> {
        if !self.has_role(caller, Role::SuperAdmin) {
            return Err(RoleError::NotAuthorized {
                caller: caller.clone(),
                action: "batch-grant roles".to_string(),
            });
        }
        if accounts.len() != roles.len() {
            return Err(RoleError::BatchLengthMismatch {
                accounts: accounts.len(),
                roles: roles.len(),
            });
        }
        for (account, role) in accounts.iter().zip(roles) {
            if !account.is_valid() {
                return Err(RoleError::InvalidAccount);
            }
            if role.is_protected() {
                return Err(RoleError::ProtectedRole(*role));
            }
        }

        let mut granted = 0;
        for (account, role) in accounts.iter().zip(roles) {
            if self.has_role(account, *role) {
                continue;
            }
            self.memberships
                .entry(account.clone())
                .or_default()
                .insert(*role);
            granted += 1;
        }

        info!(
            granted,
            skipped = accounts.len() - granted,
            granted_by = %caller,
            "batch roles granted"
        );
        Ok(granted)
    }

    /// True membership check for a single role.
    pub fn has_role(&self, account: &Account, role: Role) -> bool {
        self.memberships
            .get(account)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }

    /// Administrative tier: `SuperAdmin` or `Admin`.
    pub fn is_admin(&self, account: &Account) -> bool {
        self.has_role(account, Role::SuperAdmin) || self.has_role(account, Role::Admin)
    }

    /// Issuance capability: `SuperAdmin`, `Admin`, or `Issuer`. Note that
    /// holding the capability is not the same as exercising it; the ledger
    /// routes `Admin` through the proposal workflow.
    pub fn can_issue(&self, account: &Account) -> bool {
        self.has_role(account, Role::SuperAdmin)
            || self.has_role(account, Role::Admin)
            || self.has_role(account, Role::Issuer)
    }

    /// Certificate revocation is not delegated below the top tier; the
    /// `Revoker` role is currently inert.
    pub fn can_revoke(&self, account: &Account) -> bool {
        self.has_role(account, Role::SuperAdmin)
    }

    /// All roles held by `account`, in stable sorted order.
    pub fn roles_of(&self, account: &Account) -> Vec<Role> {
        self.memberships
            .get(account)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Emergency revocation history, oldest first.
    pub fn emergency_revocations(&self) -> &[EmergencyRevocation] {
        &self.emergency_revocations
    }

    /// Role request history, oldest first.
    pub fn role_requests(&self) -> &[RoleRequest] {
        &self.role_requests
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
