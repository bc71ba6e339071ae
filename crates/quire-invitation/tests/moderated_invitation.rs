//! Moderated invitation scenarios

mod common;

use assert_matches::assert_matches;
use common::{SiteFixture, CONSUMER, SITE};
use quire_core::effects::SiteEffects;
use quire_core::UserName;
use quire_invitation::error::keys;
use quire_invitation::model::moderated;
use quire_invitation::{
    Invitation, InvitationError, InvitationStatus, ModeratedInvitation, ModeratedInviteRequest,
};

async fn request(fixture: &SiteFixture) -> (UserName, ModeratedInvitation) {
    let carol = fixture
        .effects
        .add_user("carol", "Carol", "King", "carol@example.org");
    fixture.effects.set_current_user(carol.clone());
    let invitation = fixture
        .service
        .invite_moderated(ModeratedInviteRequest::new(carol.clone(), SITE, CONSUMER, "let me in"))
        .await
        .unwrap();
    fixture.effects.set_current_user(fixture.manager.clone());
    (carol, invitation)
}

#[tokio::test]
async fn request_waits_for_review() {
    let fixture = SiteFixture::new();
    let (carol, invitation) = request(&fixture).await;

    assert_eq!(invitation.status, InvitationStatus::Review);
    assert_eq!(invitation.invitee_user_name, carol);
    assert_eq!(invitation.invitee_comments, "let me in");
    assert!(invitation.reviewer.is_none());

    let mail = fixture.effects.sent_mail();
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].to, vec!["GROUP_site_alpha_SiteManager".to_string()]);
    assert_eq!(mail[0].template, moderated::MAIL_TEMPLATE);

    let fetched = fixture
        .service
        .get_invitation(invitation.invite_id.as_str())
        .await
        .unwrap();
    assert_eq!(fetched, Invitation::Moderated(invitation));
}

#[tokio::test]
async fn approval_grants_membership_as_the_reviewer() {
    let fixture = SiteFixture::new();
    let (carol, invitation) = request(&fixture).await;

    let approved = fixture
        .service
        .approve(invitation.invite_id.as_str(), Some("welcome"))
        .await
        .unwrap();
    let approved = approved.as_moderated().unwrap();
    assert_eq!(approved.status, InvitationStatus::Approved);
    assert_eq!(approved.reviewer.as_ref(), Some(&fixture.manager));
    assert_eq!(approved.review_comments.as_deref(), Some("welcome"));

    assert_eq!(
        fixture.effects.members_role(SITE, &carol).await.unwrap().as_deref(),
        Some(CONSUMER)
    );
    let grants = fixture.effects.membership_grants();
    assert_eq!(grants[0].run_as, fixture.manager);

    let err = fixture
        .service
        .approve(invitation.invite_id.as_str(), None)
        .await
        .unwrap_err();
    assert_eq!(err.key(), Some(keys::ALREADY_FINISHED));
}

#[tokio::test]
async fn only_managers_review() {
    let fixture = SiteFixture::new();
    let (carol, invitation) = request(&fixture).await;

    fixture.effects.set_current_user(carol);
    let err = fixture
        .service
        .approve(invitation.invite_id.as_str(), None)
        .await
        .unwrap_err();
    assert_matches!(err, InvitationError::Forbidden { .. });
    let err = fixture
        .service
        .reject(invitation.invite_id.as_str(), None)
        .await
        .unwrap_err();
    assert_matches!(err, InvitationError::Forbidden { .. });
}

#[tokio::test]
async fn nominated_invitations_cannot_be_approved() {
    let fixture = SiteFixture::new();
    let nominated = fixture
        .invite_external("Ann", "Lee", "x@y.com", SITE)
        .await;
    let err = fixture
        .service
        .approve(nominated.invite_id.as_str(), None)
        .await
        .unwrap_err();
    assert_matches!(err, InvitationError::UserError { .. });
    assert_eq!(err.key(), Some(keys::WRONG_TYPE));
}

#[tokio::test]
async fn rejection_notifies_the_invitee() {
    let fixture = SiteFixture::new();
    let (carol, invitation) = request(&fixture).await;

    let rejected = fixture
        .service
        .reject(invitation.invite_id.as_str(), Some("members only"))
        .await
        .unwrap();
    assert_eq!(rejected.status(), InvitationStatus::Rejected);
    assert!(!fixture.effects.is_member(SITE, &carol).await.unwrap());

    let mail = fixture.effects.sent_mail();
    let last = mail.last().unwrap();
    assert_eq!(last.template, moderated::REJECT_TEMPLATE);
    assert_eq!(last.to, vec!["carol@example.org".to_string()]);
    assert_eq!(last.model["reviewComments"], "members only");
}

#[tokio::test]
async fn rejection_mail_failure_is_not_fatal() {
    let fixture = SiteFixture::new();
    let (_, invitation) = request(&fixture).await;
    fixture.effects.fail_mail(true);

    let rejected = fixture
        .service
        .reject(invitation.invite_id.as_str(), None)
        .await
        .unwrap();
    assert_eq!(rejected.status(), InvitationStatus::Rejected);
}

#[tokio::test]
async fn invitee_updates_comments_under_review() {
    let fixture = SiteFixture::new();
    let (carol, invitation) = request(&fixture).await;

    let updated = fixture
        .service
        .update_moderated_invitation(&carol, SITE, Some("pretty please"))
        .await
        .unwrap();
    assert_eq!(updated.invite_id, invitation.invite_id);
    assert_eq!(updated.invitee_comments, "pretty please");
    assert!(updated.modified_at.is_some());
    assert_eq!(updated.status, InvitationStatus::Review);

    let err = fixture
        .service
        .update_moderated_invitation(&UserName::new("nobody"), SITE, None)
        .await
        .unwrap_err();
    assert_matches!(err, InvitationError::NotFound { .. });
    assert_eq!(err.key(), Some(keys::NOT_FOUND_BY_INVITEE));
}

#[tokio::test]
async fn invitee_may_withdraw_once() {
    let fixture = SiteFixture::new();
    let (carol, invitation) = request(&fixture).await;
    let id = invitation.invite_id.as_str();

    let eve = fixture.effects.add_user("eve", "Eve", "Ives", "eve@example.org");
    fixture.effects.set_current_user(eve);
    let err = fixture.service.cancel(id).await.unwrap_err();
    assert_eq!(err.key(), Some(keys::CANCEL_NOT_SITE_MANAGER));

    fixture.effects.set_current_user(carol);
    let cancelled = fixture.service.cancel(id).await.unwrap().unwrap();
    assert_eq!(cancelled.status(), InvitationStatus::Cancelled);

    let err = fixture.service.cancel(id).await.unwrap_err();
    assert_matches!(err, InvitationError::UserError { .. });
    assert_eq!(err.key(), Some(keys::ALREADY_FINISHED));
}

#[tokio::test]
async fn members_cannot_request_again() {
    let fixture = SiteFixture::new();
    let err = fixture
        .service
        .invite_moderated(ModeratedInviteRequest::new(
            fixture.manager.clone(),
            SITE,
            CONSUMER,
            "",
        ))
        .await
        .unwrap_err();
    assert_eq!(err.key(), Some(keys::ALREADY_MEMBER));

    let err = fixture
        .service
        .invite_moderated(ModeratedInviteRequest::new("ghost", SITE, CONSUMER, ""))
        .await
        .unwrap_err();
    assert_matches!(err, InvitationError::NotFound { .. });
}
