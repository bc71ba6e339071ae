//! Invitation search criteria

use crate::invitation::{Invitation, InvitationType, ResourceType};
use quire_core::UserName;
use serde::{Deserialize, Serialize};

/// Which workflows a search covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationTypeFilter {
    /// Both nominated and moderated
    #[default]
    All,
    /// Nominated only
    Nominated,
    /// Moderated only
    Moderated,
}

impl InvitationTypeFilter {
    /// Whether the filter admits the given kind
    pub fn includes(self, kind: InvitationType) -> bool {
        match self {
            Self::All => true,
            Self::Nominated => kind == InvitationType::Nominated,
            Self::Moderated => kind == InvitationType::Moderated,
        }
    }
}

/// Search criteria; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationSearchCriteria {
    /// Invited or requesting user
    pub invitee: Option<UserName>,
    /// Site manager who sent the invitation
    pub inviter: Option<UserName>,
    /// Site short name
    pub resource_name: Option<String>,
    /// Kind of resource
    pub resource_type: Option<ResourceType>,
    /// Workflows searched
    pub invitation_type: InvitationTypeFilter,
}

impl InvitationSearchCriteria {
    /// Criteria matching every pending invitation
    pub fn new() -> Self {
        Self::default()
    }

    /// Match one invitee
    pub fn invitee(mut self, invitee: impl Into<UserName>) -> Self {
        self.invitee = Some(invitee.into());
        self
    }

    /// Match one inviter; excludes moderated invitations
    pub fn inviter(mut self, inviter: impl Into<UserName>) -> Self {
        self.inviter = Some(inviter.into());
        self
    }

    /// Match one resource
    pub fn resource(mut self, resource_type: ResourceType, resource_name: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type);
        self.resource_name = Some(resource_name.into());
        self
    }

    /// Match a resource kind
    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    /// Restrict the workflows searched
    pub fn invitation_type(mut self, filter: InvitationTypeFilter) -> Self {
        self.invitation_type = filter;
        self
    }

    /// Exact match of every set field
    ///
    /// An inviter criterion never matches a moderated invitation.
    pub fn matches(&self, invitation: &Invitation) -> bool {
        self.invitation_type.includes(invitation.invitation_type())
            && self
                .invitee
                .as_ref()
                .map_or(true, |invitee| invitation.invitee_user_name() == invitee)
            && self
                .inviter
                .as_ref()
                .map_or(true, |inviter| invitation.inviter_user_name() == Some(inviter))
            && self
                .resource_name
                .as_deref()
                .map_or(true, |name| invitation.resource_name() == name)
            && self
                .resource_type
                .map_or(true, |kind| invitation.resource_type() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::InvitationId;
    use crate::invitation::{InvitationStatus, ModeratedInvitation};
    use chrono::{TimeZone, Utc};

    fn moderated(invitee: &str, site: &str) -> Invitation {
        Invitation::Moderated(ModeratedInvitation {
            invite_id: InvitationId::parse("jbpm$3").unwrap(),
            invitee_user_name: invitee.into(),
            role_name: "SiteConsumer".into(),
            resource_type: ResourceType::WebSite,
            resource_name: site.into(),
            invitee_comments: String::new(),
            reviewer: None,
            review_comments: None,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
            modified_at: None,
            status: InvitationStatus::Review,
        })
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        assert!(InvitationSearchCriteria::new().matches(&moderated("carol", "alpha")));
    }

    #[test]
    fn test_fields_must_match_exactly() {
        let invitation = moderated("carol", "alpha");
        let criteria = InvitationSearchCriteria::new()
            .invitee("carol")
            .resource(ResourceType::WebSite, "alpha");
        assert!(criteria.matches(&invitation));
        assert!(!criteria.clone().invitee("caro").matches(&invitation));
        assert!(!criteria
            .clone()
            .invitation_type(InvitationTypeFilter::Nominated)
            .matches(&invitation));
        assert!(!InvitationSearchCriteria::new()
            .inviter("alice")
            .matches(&invitation));
    }
}
