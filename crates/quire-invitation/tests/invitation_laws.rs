//! Property laws of invitation transitions

mod common;

use common::{SiteFixture, SITE};
use proptest::prelude::*;
use quire_invitation::error::keys;
use quire_invitation::{InvitationConfig, InvitationError, InvitationStatus};
use quire_testkit::strategies::arb_ticket;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    Accept,
    Reject,
    Cancel,
}

fn arb_transition() -> impl Strategy<Value = Transition> {
    prop::sample::select(vec![Transition::Accept, Transition::Reject, Transition::Cancel])
}

async fn apply(
    fixture: &SiteFixture,
    id: &str,
    ticket: &str,
    transition: Transition,
) -> Result<(), InvitationError> {
    match transition {
        Transition::Accept => fixture.service.accept(id, ticket).await.map(|_| ()),
        Transition::Reject => fixture.service.reject(id, None).await.map(|_| ()),
        Transition::Cancel => fixture.service.cancel(id).await.map(|_| ()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn foreign_tickets_never_grant_membership(ticket in arb_ticket()) {
        runtime().block_on(async {
            let fixture = SiteFixture::with_config(InvitationConfig::testing());
            let invitation = fixture.invite_external("Ann", "Lee", "x@y.com", SITE).await;
            prop_assume!(ticket != invitation.ticket);

            let result = fixture.service.accept(invitation.invite_id.as_str(), &ticket).await;
            prop_assert!(matches!(result, Err(InvitationError::Forbidden { .. })), "{:?}", result);
            prop_assert!(fixture.effects.membership_grants().is_empty());

            let current = fixture.service.get_invitation(invitation.invite_id.as_str()).await.unwrap();
            prop_assert_eq!(current.status(), InvitationStatus::Pending);
            Ok(())
        })?;
    }

    #[test]
    fn terminated_invitations_refuse_further_transitions(
        first in arb_transition(),
        second in arb_transition(),
    ) {
        runtime().block_on(async {
            let fixture = SiteFixture::with_config(InvitationConfig::testing());
            let invitation = fixture.invite_external("Ann", "Lee", "x@y.com", SITE).await;
            let id = invitation.invite_id.as_str();

            prop_assert!(apply(&fixture, id, &invitation.ticket, first).await.is_ok());
            let err = apply(&fixture, id, &invitation.ticket, second).await.unwrap_err();
            prop_assert!(matches!(err, InvitationError::UserError { .. }), "{:?}", err);
            prop_assert_eq!(err.key(), Some(keys::ALREADY_FINISHED));

            let current = fixture.service.get_invitation(id).await.unwrap();
            prop_assert!(current.status().is_terminal());
            Ok(())
        })?;
    }
}
