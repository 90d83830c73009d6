//! Permission tiers and the delegation table.

use serde::{Deserialize, Serialize};

/// The closed set of permission tiers.
///
/// Membership is a many-to-many relation between accounts and roles,
/// mutated only through the `credo-roles` registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Held only by the bootstrapping identity; never granted at runtime.
    Root,
    /// The top administrative tier: administers every non-protected role,
    /// controls the pause switch, thresholds, and revocation.
    SuperAdmin,
    /// May create and approve issuance proposals, and administers the
    /// operational roles below.
    Admin,
    /// May mint certificates directly.
    Issuer,
    /// Reserved for a future revocation capability; currently inert
    /// (certificate revocation remains `SuperAdmin`-only).
    Revoker,
    /// Read-side role for verification surfaces.
    Verifier,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Root,
        Role::SuperAdmin,
        Role::Admin,
        Role::Issuer,
        Role::Revoker,
        Role::Verifier,
    ];

    /// The role that ordinarily administers (grants and revokes) this one.
    ///
    /// `Root` has no administrator: it can neither be granted nor revoked
    /// at runtime. `SuperAdmin` additionally carries a hard-coded override
    /// allowing it to administer every non-protected role directly; that
    /// override lives in the registry, not in this table.
    pub fn administered_by(self) -> Option<Role> {
        match self {
            Role::Root => None,
            Role::SuperAdmin => Some(Role::Root),
            Role::Admin => Some(Role::SuperAdmin),
            Role::Issuer | Role::Revoker | Role::Verifier => Some(Role::Admin),
        }
    }

    /// Protected roles sit above the delegation override and the
    /// emergency path: nothing strips or grants them except `Root`
    /// administering `SuperAdmin`.
    pub fn is_protected(self) -> bool {
        matches!(self, Role::Root | Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Root => "ROOT",
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Issuer => "ISSUER",
            Role::Revoker => "REVOKER",
            Role::Verifier => "VERIFIER",
        };
        write!(f, "{name}")
    }
}
