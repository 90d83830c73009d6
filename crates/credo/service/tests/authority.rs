//! End-to-end tests over the authority facade: the administrator
//! issuance workflow, direct minting, revocation, emergency control, and
//! the notification stream.

use credo_service::{AuthorityConfig, CertificateAuthority, ErrorKind};
use credo_types::{Account, CredoEvent, ProposalStatus, Role};

fn root() -> Account {
    Account::new("root")
}

/// Authority with admins a/b/c/d and issuer "iss", threshold 3.
fn setup() -> CertificateAuthority {
    let mut authority = CertificateAuthority::with_config(
        &root(),
        AuthorityConfig {
            approval_threshold: 3,
            ..AuthorityConfig::default()
        },
    )
    .unwrap();

    for name in ["a", "b", "c", "d"] {
        authority
            .grant_role(&root(), Role::Admin, &Account::new(name))
            .unwrap();
    }
    authority
        .grant_role(&root(), Role::Issuer, &Account::new("iss"))
        .unwrap();
    authority
}

#[test]
fn administrator_issuance_runs_through_the_proposal_workflow() {
    let mut authority = setup();
    let a = Account::new("a");
    let carol = Account::new("carol");

    // An admin cannot mint directly, regardless of threshold or pause state.
    let direct = authority.mint_certificate(&a, &carol, "ipfs://cert");
    assert_eq!(direct.unwrap_err().kind(), ErrorKind::Authorization);

    // So it proposes, and three distinct peers agree.
    let id = authority
        .create_proposal(&a, &carol, "Graduation", "Completed the program", "ipfs://cert")
        .unwrap();

    authority.approve_proposal(&Account::new("b"), id).unwrap();
    authority.approve_proposal(&Account::new("c"), id).unwrap();
    assert!(authority.proposal(id).unwrap().is_pending());
    assert_eq!(authority.total_minted(), 0);

    // The third distinct, non-proposer approval mints atomically.
    let outcome = authority.approve_proposal(&Account::new("d"), id).unwrap();
    let certificate_id = outcome.executed.expect("threshold reached");

    let proposal = authority.proposal(id).unwrap();
    assert_eq!(proposal.status(), ProposalStatus::Executed);
    assert_eq!(proposal.approval_count(), 3);
    assert_eq!(proposal.certificate_id, Some(certificate_id));

    let certificate = authority.certificate_details(certificate_id).unwrap();
    assert_eq!(certificate.owner, carol);
    assert!(authority.verify_certificate(certificate_id));
    assert_eq!(authority.certificates_of(&carol), vec![certificate_id]);
}

#[test]
fn issuer_and_super_admin_mint_directly() {
    let mut authority = setup();
    let carol = Account::new("carol");

    let first = authority
        .mint_certificate(&Account::new("iss"), &carol, "ipfs://1")
        .unwrap();
    let second = authority.mint_certificate(&root(), &carol, "ipfs://2").unwrap();

    assert!(authority.verify_certificate(first));
    assert!(authority.verify_certificate(second));
    assert_eq!(authority.total_minted(), 2);
}

#[test]
fn proposer_and_duplicate_approvals_are_rejected() {
    let mut authority = setup();
    let a = Account::new("a");
    let b = Account::new("b");
    let id = authority
        .create_proposal(&a, &Account::new("carol"), "t", "d", "ipfs://m")
        .unwrap();

    assert_eq!(
        authority.approve_proposal(&a, id).unwrap_err().kind(),
        ErrorKind::InvalidState
    );

    authority.approve_proposal(&b, id).unwrap();
    assert_eq!(
        authority.approve_proposal(&b, id).unwrap_err().kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(authority.proposal(id).unwrap().approval_count(), 1);
    assert!(authority.has_approved(id, &b).unwrap());
}

#[test]
fn withdrawn_approvals_reopen_the_slot() {
    let mut authority = setup();
    let b = Account::new("b");
    let id = authority
        .create_proposal(&Account::new("a"), &Account::new("carol"), "t", "d", "ipfs://m")
        .unwrap();

    authority.approve_proposal(&b, id).unwrap();
    assert_eq!(authority.revoke_approval(&b, id).unwrap(), 0);
    assert!(!authority.has_approved(id, &b).unwrap());

    // The same account may approve again later.
    let outcome = authority.approve_proposal(&b, id).unwrap();
    assert_eq!(outcome.approvals, 1);
}

#[test]
fn lowered_threshold_unlocks_manual_execution() {
    let mut authority = setup();
    let id = authority
        .create_proposal(&Account::new("a"), &Account::new("carol"), "t", "d", "ipfs://m")
        .unwrap();

    authority.approve_proposal(&Account::new("b"), id).unwrap();
    authority.approve_proposal(&Account::new("c"), id).unwrap();

    // Two approvals sit below the threshold of three.
    assert_eq!(
        authority
            .execute_proposal(&Account::new("d"), id)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidState
    );

    authority.set_approval_threshold(&root(), 2).unwrap();
    let certificate_id = authority.execute_proposal(&Account::new("d"), id).unwrap();

    assert_eq!(authority.proposal(id).unwrap().status(), ProposalStatus::Executed);
    assert!(authority.verify_certificate(certificate_id));

    // Execution is single-shot even with both paths available.
    assert_eq!(
        authority
            .execute_proposal(&Account::new("d"), id)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(authority.total_minted(), 1);
}

#[test]
fn cancelled_proposals_are_terminal() {
    let mut authority = setup();
    let id = authority
        .create_proposal(&Account::new("a"), &Account::new("carol"), "t", "d", "ipfs://m")
        .unwrap();

    // Cancellation is reserved for the top tier.
    assert_eq!(
        authority
            .cancel_proposal(&Account::new("a"), id)
            .unwrap_err()
            .kind(),
        ErrorKind::Authorization
    );

    authority.cancel_proposal(&root(), id).unwrap();
    assert_eq!(authority.proposal(id).unwrap().status(), ProposalStatus::Cancelled);

    assert_eq!(
        authority
            .approve_proposal(&Account::new("b"), id)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidState
    );
    assert!(authority.pending_proposals().is_empty());
}

#[test]
fn certificate_ids_survive_revocation_without_reuse() {
    let mut authority = setup();
    let carol = Account::new("carol");

    let mut ids = Vec::new();
    for i in 1..=3 {
        ids.push(
            authority
                .mint_certificate(&root(), &carol, &format!("ipfs://{i}"))
                .unwrap(),
        );
    }

    authority.revoke_certificate(&root(), ids[0]).unwrap();
    assert_eq!(authority.total_minted(), 3);
    assert_eq!(authority.total_revoked(), 1);

    let fourth = authority.mint_certificate(&root(), &carol, "ipfs://4").unwrap();
    assert_eq!(fourth.0, 4);

    // Revocation is one-way and keeps ownership.
    assert_eq!(
        authority
            .revoke_certificate(&root(), ids[0])
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(authority.certificate_details(ids[0]).unwrap().owner, carol);

    let stats = authority.ledger_stats();
    assert_eq!(stats.total_minted, 4);
    assert_eq!(stats.total_revoked, 1);
    assert_eq!(stats.active, 3);
}

#[test]
fn pause_freezes_mutations_but_not_queries_or_roles() {
    let mut authority = setup();
    let minted = authority
        .mint_certificate(&root(), &Account::new("carol"), "ipfs://1")
        .unwrap();
    let id = authority
        .create_proposal(&Account::new("a"), &Account::new("carol"), "t", "d", "ipfs://m")
        .unwrap();

    authority.pause(&root()).unwrap();

    for err in [
        authority
            .mint_certificate(&Account::new("iss"), &Account::new("x"), "ipfs://2")
            .unwrap_err(),
        authority.revoke_certificate(&root(), minted).unwrap_err(),
        authority.approve_proposal(&Account::new("b"), id).unwrap_err(),
        authority.execute_proposal(&Account::new("b"), id).unwrap_err(),
        authority.cancel_proposal(&root(), id).unwrap_err(),
        authority.set_approval_threshold(&root(), 2).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Paused);
    }

    // Queries stay live.
    assert!(authority.verify_certificate(minted));
    assert!(authority.proposal(id).unwrap().is_pending());
    assert_eq!(authority.approval_threshold(), 3);

    // The role hierarchy, including the emergency path, stays live.
    authority
        .emergency_revoke_role(&root(), &Account::new("iss"), Role::Issuer, "incident")
        .unwrap();

    authority.unpause(&root()).unwrap();
    authority.approve_proposal(&Account::new("b"), id).unwrap();
}

#[test]
fn delegation_rules_hold_at_the_facade() {
    let mut authority = setup();
    let a = Account::new("a");

    // An admin granting Admin always fails.
    assert_eq!(
        authority
            .grant_role(&a, Role::Admin, &Account::new("x"))
            .unwrap_err()
            .kind(),
        ErrorKind::Authorization
    );

    // An admin administers the operational roles.
    authority
        .grant_role(&a, Role::Verifier, &Account::new("v"))
        .unwrap();
    assert_eq!(authority.user_roles(&Account::new("v")), vec![Role::Verifier]);

    // Capability queries reflect the anomaly: Revoker does not revoke.
    authority
        .grant_role(&a, Role::Revoker, &Account::new("rev"))
        .unwrap();
    assert!(!authority.can_revoke(&Account::new("rev")));
    assert!(authority.can_issue(&a));
    assert!(authority.is_admin(&a));
}

#[test]
fn batch_grant_is_atomic_and_audited() {
    let mut authority = setup();
    let mut rx = authority.subscribe();

    let result = authority.batch_grant_roles(
        &root(),
        &[Account::new("x"), Account::new("y")],
        &[Role::Verifier],
    );
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
    assert!(authority.user_roles(&Account::new("x")).is_empty());
    assert!(rx.try_recv().is_err(), "failed batch emits nothing");

    let granted = authority
        .batch_grant_roles(
            &root(),
            &[Account::new("x"), Account::new("y")],
            &[Role::Verifier, Role::Issuer],
        )
        .unwrap();
    assert_eq!(granted, 2);

    let envelope = rx.try_recv().unwrap();
    assert!(matches!(
        envelope.event,
        CredoEvent::RolesBatchGranted { granted: 2, skipped: 0 }
    ));
}

#[test]
fn the_event_stream_reconstructs_the_issuance_story() {
    let mut authority = setup();
    let mut rx = authority.subscribe();
    let a = Account::new("a");
    let carol = Account::new("carol");

    let id = authority
        .create_proposal(&a, &carol, "Graduation", "d", "ipfs://m")
        .unwrap();
    authority.approve_proposal(&Account::new("b"), id).unwrap();
    authority.revoke_approval(&Account::new("b"), id).unwrap();
    authority.set_approval_threshold(&root(), 1).unwrap();
    authority.approve_proposal(&Account::new("c"), id).unwrap();

    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.event);
    }

    assert!(matches!(events[0], CredoEvent::ProposalCreated { .. }));
    assert!(matches!(events[1], CredoEvent::ProposalApproved { approvals: 1, .. }));
    assert!(matches!(events[2], CredoEvent::ApprovalRevoked { approvals: 0, .. }));
    assert!(matches!(
        events[3],
        CredoEvent::ThresholdChanged { previous: 3, current: 1 }
    ));
    assert!(matches!(events[4], CredoEvent::ProposalExecuted { .. }));
    assert_eq!(events.len(), 5, "exactly one event per successful mutation");
}

#[test]
fn request_role_records_an_audit_entry_only() {
    let mut authority = setup();
    let newcomer = Account::new("newcomer");

    authority
        .request_role(&newcomer, Role::Issuer, "issuing for the spring cohort")
        .unwrap();

    assert!(authority.user_roles(&newcomer).is_empty());
    assert_eq!(authority.role_requests().len(), 1);
    assert_eq!(authority.role_requests()[0].account, newcomer);

    // Requests for protected tiers are refused outright.
    assert_eq!(
        authority
            .request_role(&newcomer, Role::SuperAdmin, "please")
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidState
    );
}
