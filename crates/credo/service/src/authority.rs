//! The certificate authority facade.

use tokio::sync::broadcast;
use tracing::{info, warn};

use credo_ledger::{CertificateLedger, LedgerStats};
use credo_proposals::{ApprovalOutcome, ProposalEngine};
use credo_roles::{EmergencyRevocation, RoleError, RoleRegistry, RoleRequest};
use credo_types::{
    Account, Certificate, CertificateId, CredoEvent, EventEnvelope, EventSeverity, Proposal,
    ProposalId, Role,
};

use crate::bus::EventBus;
use crate::config::AuthorityConfig;
use crate::error::CredoError;

/// The certificate authority - the single entry point for every
/// operation Credo exposes to collaborators.
///
/// Owns the role registry, the certificate ledger, the proposal engine,
/// the pause switch, and the event bus. Mutations take `&mut self` and
/// are validate-then-commit; exactly one event is emitted per successful
/// mutation, after it commits, and none on failure.
pub struct CertificateAuthority {
    roles: RoleRegistry,
    ledger: CertificateLedger,
    proposals: ProposalEngine,
    paused: bool,
    events: EventBus,
}

impl CertificateAuthority {
    /// Create an authority with default configuration, seeded with the
    /// deploying identity (which receives `Root` and `SuperAdmin`).
    pub fn new(deployer: &Account) -> Result<Self, CredoError> {
        Self::with_config(deployer, AuthorityConfig::default())
    }

    pub fn with_config(deployer: &Account, config: AuthorityConfig) -> Result<Self, CredoError> {
        let roles = RoleRegistry::bootstrap(deployer)?;
        let proposals = ProposalEngine::new(config.approval_threshold)?;

        info!(deployer = %deployer, threshold = config.approval_threshold, "authority created");
        Ok(Self {
            roles,
            ledger: CertificateLedger::new(),
            proposals,
            paused: false,
            events: EventBus::new(config.event_capacity),
        })
    }

    /// Subscribe to the notification stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    fn ensure_active(&self) -> Result<(), CredoError> {
        if self.paused {
            return Err(CredoError::Paused);
        }
        Ok(())
    }

    fn require_super_admin(&self, caller: &Account, action: &str) -> Result<(), CredoError> {
        if !self.roles.has_role(caller, Role::SuperAdmin) {
            return Err(RoleError::NotAuthorized {
                caller: caller.clone(),
                action: action.to_string(),
            }
            .into());
        }
        Ok(())
    }

    // =========================================================================
    // ROLE HIERARCHY
    // =========================================================================
    //
    // Role operations stay available while paused: the emergency path has
    // to work precisely when the rest of the system is frozen.

    pub fn grant_role(
        &mut self,
        caller: &Account,
        role: Role,
        account: &Account,
    ) -> Result<(), CredoError> {
        self.roles.grant_role(caller, role, account)?;
        self.events.emit(
            caller,
            EventSeverity::Info,
            CredoEvent::RoleGranted {
                role,
                account: account.clone(),
            },
        );
        Ok(())
    }

    pub fn revoke_role(
        &mut self,
        caller: &Account,
        role: Role,
        account: &Account,
    ) -> Result<(), CredoError> {
        self.roles.revoke_role(caller, role, account)?;
        self.events.emit(
            caller,
            EventSeverity::Warning,
            CredoEvent::RoleRevoked {
                role,
                account: account.clone(),
            },
        );
        Ok(())
    }

    pub fn emergency_revoke_role(
        &mut self,
        caller: &Account,
        account: &Account,
        role: Role,
        reason: &str,
    ) -> Result<(), CredoError> {
        self.roles
            .emergency_revoke_role(caller, account, role, reason)?;
        self.events.emit(
            caller,
            EventSeverity::Critical,
            CredoEvent::EmergencyRoleRevoked {
                role,
                account: account.clone(),
                reason: reason.to_string(),
            },
        );
        Ok(())
    }

    pub fn request_role(
        &mut self,
        caller: &Account,
        role: Role,
        justification: &str,
    ) -> Result<(), CredoError> {
        self.roles.request_role(caller, role, justification)?;
        self.events.emit(
            caller,
            EventSeverity::Info,
            CredoEvent::RoleRequested {
                role,
                justification: justification.to_string(),
            },
        );
        Ok(())
    }

    pub fn batch_grant_roles(
        &mut self,
        caller: &Account,
        accounts: &[Account],
        roles: &[Role],
    ) -> Result<usize, CredoError> {
        let granted = self.roles.batch_grant_roles(caller, accounts, roles)?;
        self.events.emit(
            caller,
            EventSeverity::Info,
            CredoEvent::RolesBatchGranted {
                granted,
                skipped: accounts.len() - granted,
            },
        );
        Ok(granted)
    }

    // =========================================================================
    // EMERGENCY CONTROL
    // =========================================================================

    /// Suspend every certificate- and proposal-mutating operation.
    pub fn pause(&mut self, caller: &Account) -> Result<(), CredoError> {
        self.require_super_admin(caller, "pause the system")?;
        if self.paused {
            return Err(CredoError::AlreadyPaused);
        }

        self.paused = true;
        warn!(paused_by = %caller, "system paused");
        self.events
            .emit(caller, EventSeverity::Critical, CredoEvent::Paused);
        Ok(())
    }

    /// Resume normal operation.
    pub fn unpause(&mut self, caller: &Account) -> Result<(), CredoError> {
        self.require_super_admin(caller, "unpause the system")?;
        if !self.paused {
            return Err(CredoError::NotPaused);
        }

        self.paused = false;
        info!(unpaused_by = %caller, "system unpaused");
        self.events
            .emit(caller, EventSeverity::Info, CredoEvent::Unpaused);
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // =========================================================================
    // CERTIFICATES
    // =========================================================================

    pub fn mint_certificate(
        &mut self,
        caller: &Account,
        recipient: &Account,
        metadata_ref: &str,
    ) -> Result<CertificateId, CredoError> {
        self.ensure_active()?;
        let certificate_id = self.ledger.mint(&self.roles, caller, recipient, metadata_ref)?;
        self.events.emit(
            caller,
            EventSeverity::Info,
            CredoEvent::CertificateMinted {
                certificate_id,
                recipient: recipient.clone(),
            },
        );
        Ok(certificate_id)
    }

    pub fn revoke_certificate(
        &mut self,
        caller: &Account,
        id: CertificateId,
    ) -> Result<(), CredoError> {
        self.ensure_active()?;
        self.ledger.revoke(&self.roles, caller, id)?;
        self.events.emit(
            caller,
            EventSeverity::Warning,
            CredoEvent::CertificateRevoked { certificate_id: id },
        );
        Ok(())
    }

    /// True iff the certificate exists and is not revoked. Available
    /// while paused.
    pub fn verify_certificate(&self, id: CertificateId) -> bool {
        self.ledger.verify(id)
    }

    pub fn certificate_details(&self, id: CertificateId) -> Result<&Certificate, CredoError> {
        Ok(self.ledger.get(id)?)
    }

    pub fn certificates_of(&self, account: &Account) -> Vec<CertificateId> {
        self.ledger.certificates_of(account)
    }

    pub fn total_minted(&self) -> u64 {
        self.ledger.total_minted()
    }

    pub fn total_revoked(&self) -> u64 {
        self.ledger.total_revoked()
    }

    pub fn ledger_stats(&self) -> LedgerStats {
        self.ledger.stats()
    }

    // =========================================================================
    // PROPOSALS
    // =========================================================================

    pub fn create_proposal(
        &mut self,
        caller: &Account,
        recipient: &Account,
        title: &str,
        description: &str,
        metadata_ref: &str,
    ) -> Result<ProposalId, CredoError> {
        self.ensure_active()?;
        let proposal_id = self.proposals.create(
            &self.roles,
            caller,
            recipient,
            title,
            description,
            metadata_ref,
        )?;
        self.events.emit(
            caller,
            EventSeverity::Info,
            CredoEvent::ProposalCreated {
                proposal_id,
                recipient: recipient.clone(),
            },
        );
        Ok(proposal_id)
    }

    /// Approve a proposal; the approval that reaches the threshold also
    /// mints the certificate and emits `ProposalExecuted` instead of
    /// `ProposalApproved` (one mutation, one event).
    pub fn approve_proposal(
        &mut self,
        caller: &Account,
        id: ProposalId,
    ) -> Result<ApprovalOutcome, CredoError> {
        self.ensure_active()?;
        let outcome = self
            .proposals
            .approve(&self.roles, &mut self.ledger, caller, id)?;

        match outcome.executed {
            Some(certificate_id) => self.events.emit(
                caller,
                EventSeverity::Info,
                CredoEvent::ProposalExecuted {
                    proposal_id: id,
                    certificate_id,
                },
            ),
            None => self.events.emit(
                caller,
                EventSeverity::Info,
                CredoEvent::ProposalApproved {
                    proposal_id: id,
                    approvals: outcome.approvals,
                },
            ),
        }
        Ok(outcome)
    }

    pub fn revoke_approval(
        &mut self,
        caller: &Account,
        id: ProposalId,
    ) -> Result<u32, CredoError> {
        self.ensure_active()?;
        let approvals = self.proposals.revoke_approval(caller, id)?;
        self.events.emit(
            caller,
            EventSeverity::Info,
            CredoEvent::ApprovalRevoked {
                proposal_id: id,
                approvals,
            },
        );
        Ok(approvals)
    }

    /// Manual execution fallback for proposals already at or above the
    /// threshold (e.g. after the threshold was lowered).
    pub fn execute_proposal(
        &mut self,
        caller: &Account,
        id: ProposalId,
    ) -> Result<CertificateId, CredoError> {
        self.ensure_active()?;
        let certificate_id = self
            .proposals
            .execute(&self.roles, &mut self.ledger, caller, id)?;
        self.events.emit(
            caller,
            EventSeverity::Info,
            CredoEvent::ProposalExecuted {
                proposal_id: id,
                certificate_id,
            },
        );
        Ok(certificate_id)
    }

    pub fn cancel_proposal(&mut self, caller: &Account, id: ProposalId) -> Result<(), CredoError> {
        self.ensure_active()?;
        self.proposals.cancel(&self.roles, caller, id)?;
        self.events.emit(
            caller,
            EventSeverity::Warning,
            CredoEvent::ProposalCancelled { proposal_id: id },
        );
        Ok(())
    }

    pub fn set_approval_threshold(
        &mut self,
        caller: &Account,
        threshold: u32,
    ) -> Result<(), CredoError> {
        self.ensure_active()?;
        let previous = self.proposals.set_threshold(&self.roles, caller, threshold)?;
        self.events.emit(
            caller,
            EventSeverity::Info,
            CredoEvent::ThresholdChanged {
                previous,
                current: threshold,
            },
        );
        Ok(())
    }

    pub fn approval_threshold(&self) -> u32 {
        self.proposals.threshold()
    }

    pub fn proposal(&self, id: ProposalId) -> Result<&Proposal, CredoError> {
        Ok(self.proposals.get(id)?)
    }

    pub fn all_proposal_ids(&self) -> Vec<ProposalId> {
        self.proposals.all_ids()
    }

    pub fn pending_proposals(&self) -> Vec<&Proposal> {
        self.proposals.pending()
    }

    pub fn has_approved(&self, id: ProposalId, account: &Account) -> Result<bool, CredoError> {
        Ok(self.proposals.has_approved(id, account)?)
    }

    pub fn proposal_approvers(&self, id: ProposalId) -> Result<&[Account], CredoError> {
        Ok(self.proposals.approvers(id)?)
    }

    // =========================================================================
    // READ-ONLY HELPERS
    // =========================================================================

    pub fn is_admin(&self, account: &Account) -> bool {
        self.roles.is_admin(account)
    }

    pub fn can_issue(&self, account: &Account) -> bool {
        self.roles.can_issue(account)
    }

    pub fn can_revoke(&self, account: &Account) -> bool {
        self.roles.can_revoke(account)
    }

    pub fn has_role(&self, account: &Account, role: Role) -> bool {
        self.roles.has_role(account, role)
    }

    pub fn user_roles(&self, account: &Account) -> Vec<Role> {
        self.roles.roles_of(account)
    }

    pub fn emergency_revocations(&self) -> &[EmergencyRevocation] {
        self.roles.emergency_revocations()
    }

    pub fn role_requests(&self) -> &[RoleRequest] {
        self.roles.role_requests()
    }
}
