//! Transition delegates
//!
//! Follow-up work for each invitation transition, run by the service once
//! the workflow engine has taken the transition.

use crate::cleanup::{CascadeGuard, DeletedNode};
use crate::error::InvitationResult;
use crate::invitation::{ModeratedInvitation, NominatedInvitation};
use crate::model::moderated;
use crate::model::nominated;
use crate::service::InvitationService;
use quire_core::effects::{InvitationEffects, MailMessage, SiteInfo};
use quire_core::UserName;
use std::collections::BTreeMap;

fn join_url(server_path: &str, page: &str) -> String {
    format!(
        "{}/{}",
        server_path.trim_end_matches('/'),
        page.trim_start_matches('/')
    )
}

impl<E: InvitationEffects> InvitationService<E> {
    pub(crate) async fn send_nominated_invite(
        &self,
        invitation: &NominatedInvitation,
        password: Option<&str>,
    ) -> InvitationResult<()> {
        if !self.config.send_emails {
            tracing::debug!(invite_id = %invitation.invite_id, "invite mail disabled");
            return Ok(());
        }

        let query = format!(
            "?inviteId={}&inviteeUserName={}&siteShortName={}&inviteTicket={}",
            invitation.invite_id,
            invitation.invitee_user_name,
            invitation.resource_name,
            invitation.ticket
        );
        let mut model = BTreeMap::new();
        model.insert("inviterUserName".to_string(), invitation.inviter_user_name.to_string());
        model.insert("inviteeUserName".to_string(), invitation.invitee_user_name.to_string());
        model.insert(
            "inviteeName".to_string(),
            format!("{} {}", invitation.invitee_first_name, invitation.invitee_last_name)
                .trim()
                .to_string(),
        );
        model.insert("role".to_string(), invitation.role_name.clone());
        model.insert("siteName".to_string(), invitation.resource_name.clone());
        model.insert("siteTitle".to_string(), invitation.resource_title.clone());
        model.insert(
            "acceptLink".to_string(),
            join_url(&invitation.server_path, &invitation.accept_url) + &query,
        );
        model.insert(
            "rejectLink".to_string(),
            join_url(&invitation.server_path, &invitation.reject_url) + &query,
        );
        if let Some(password) = password {
            model.insert("inviteePassword".to_string(), password.to_string());
        }

        self.effects
            .send_mail(MailMessage {
                to: vec![invitation.invitee_email.clone()],
                from: None,
                subject: nominated::MAIL_SUBJECT.to_string(),
                template: nominated::MAIL_TEMPLATE.to_string(),
                model,
            })
            .await?;
        tracing::debug!(invite_id = %invitation.invite_id, to = %invitation.invitee_email, "invite mail sent");
        Ok(())
    }

    pub(crate) async fn send_moderated_invite(
        &self,
        invitation: &ModeratedInvitation,
        managers: &str,
        site: &SiteInfo,
    ) -> InvitationResult<()> {
        if !self.config.send_emails {
            return Ok(());
        }

        let mut model = BTreeMap::new();
        model.insert("inviteeUserName".to_string(), invitation.invitee_user_name.to_string());
        model.insert("inviteeComments".to_string(), invitation.invitee_comments.clone());
        model.insert("role".to_string(), invitation.role_name.clone());
        model.insert("siteName".to_string(), site.short_name.clone());
        model.insert("siteTitle".to_string(), site.title.clone());

        self.effects
            .send_mail(MailMessage {
                to: vec![managers.to_string()],
                from: None,
                subject: moderated::MAIL_SUBJECT.to_string(),
                template: moderated::MAIL_TEMPLATE.to_string(),
                model,
            })
            .await?;
        Ok(())
    }

    /// Enable the invitee and add them to the site as the inviter
    pub(crate) async fn on_nominated_accept(&self, invitation: &NominatedInvitation) -> InvitationResult<()> {
        let invitee = &invitation.invitee_user_name;
        if self.effects.is_authentication_mutable(invitee).await?
            && !self.effects.is_authentication_enabled(invitee).await?
        {
            self.effects.set_authentication_enabled(invitee, true).await?;
            tracing::debug!(invitee = %invitee, "enabled invitee account");
        }
        if self.effects.person_exists(invitee).await? {
            self.effects.set_annullable(invitee, false).await?;
        }

        if self
            .effects
            .is_member(&invitation.resource_name, invitee)
            .await?
        {
            tracing::debug!(invitee = %invitee, site = %invitation.resource_name, "keeping existing membership");
            return Ok(());
        }
        self.effects
            .set_membership(
                &invitation.resource_name,
                invitee,
                &invitation.role_name,
                &invitation.inviter_user_name,
            )
            .await?;
        Ok(())
    }

    /// Add the invitee to the site as the reviewer
    pub(crate) async fn on_moderated_approve(
        &self,
        invitation: &ModeratedInvitation,
        reviewer: &UserName,
    ) -> InvitationResult<()> {
        self.effects
            .set_membership(
                &invitation.resource_name,
                &invitation.invitee_user_name,
                &invitation.role_name,
                reviewer,
            )
            .await?;
        Ok(())
    }

    /// Tell the invitee their request was rejected; failures are only logged
    pub(crate) async fn on_moderated_reject(
        &self,
        invitation: &ModeratedInvitation,
        reviewer: &UserName,
        comments: Option<&str>,
    ) {
        if !self.config.send_emails {
            return;
        }
        if let Err(err) = self.send_rejection(invitation, reviewer, comments).await {
            tracing::error!(
                invite_id = %invitation.invite_id,
                error = %err,
                "failed to send rejection mail"
            );
        }
    }

    async fn send_rejection(
        &self,
        invitation: &ModeratedInvitation,
        reviewer: &UserName,
        comments: Option<&str>,
    ) -> InvitationResult<()> {
        let Some(person) = self.effects.get_person(&invitation.invitee_user_name).await? else {
            return Ok(());
        };
        let mut model = BTreeMap::new();
        model.insert("siteName".to_string(), invitation.resource_name.clone());
        model.insert("reviewer".to_string(), reviewer.to_string());
        model.insert("reviewComments".to_string(), comments.unwrap_or_default().to_string());
        self.effects
            .send_mail(MailMessage {
                to: vec![person.email],
                from: None,
                subject: moderated::REJECT_TEMPLATE.to_string(),
                template: moderated::REJECT_TEMPLATE.to_string(),
                model,
            })
            .await?;
        Ok(())
    }

    /// Remove a provisioned invitee nobody is waiting on; failures are only logged
    pub(crate) async fn delete_authentication_if_unused(&self, user: &UserName, guard: &mut CascadeGuard) {
        match self.try_delete_authentication(user, guard).await {
            Ok(true) => tracing::info!(invitee = %user, "removed unused invitee account"),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(invitee = %user, error = %err, "failed to remove unused invitee account");
            }
        }
    }

    async fn try_delete_authentication(&self, user: &UserName, guard: &mut CascadeGuard) -> InvitationResult<bool> {
        if guard.is_deleting(user) {
            return Ok(false);
        }
        let Some(person) = self.effects.get_person(user).await? else {
            return Ok(false);
        };
        if !person.annullable
            || !self.effects.is_authentication_mutable(user).await?
            || self.effects.is_authentication_enabled(user).await?
        {
            return Ok(false);
        }
        if !self
            .list_pending_invitations_for_invitee(user, None)
            .await?
            .is_empty()
        {
            tracing::debug!(invitee = %user, "invitee has other pending invitations");
            return Ok(false);
        }

        self.before_delete_with(
            &DeletedNode::Person {
                user_name: user.clone(),
            },
            guard,
        )
        .await?;
        self.effects.delete_authentication(user).await?;
        self.effects.delete_person(user).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://host/share/", "/page/accept-invite"),
            "http://host/share/page/accept-invite"
        );
        assert_eq!(join_url("http://host", "p"), "http://host/p");
    }
}
