//! Invitation value objects
//!
//! Invitations are never stored on their own; they are rebuilt from the start
//! task of their workflow instance, plus the active review task for moderated
//! invitations.

use crate::error::{keys, InvitationError, InvitationResult};
use crate::id::InvitationId;
use crate::model::{moderated, nominated};
use chrono::{DateTime, Utc};
use quire_core::effects::{WorkflowInstance, WorkflowInstanceState, WorkflowTask};
use quire_core::UserName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of resource an invitation grants access to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// A collaboration site
    #[serde(rename = "WEB_SITE")]
    WebSite,
}

impl ResourceType {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebSite => "WEB_SITE",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = InvitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WEB_SITE" => Ok(Self::WebSite),
            other => Err(InvitationError::user_error(
                keys::WRONG_TYPE,
                ["resourceType", other],
            )),
        }
    }
}

/// Workflow an invitation follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvitationType {
    /// Invited by a manager, accepted or rejected by the invitee
    Nominated,
    /// Requested by the invitee, approved or rejected by a manager
    Moderated,
}

/// Lifecycle status
///
/// Nominated: `Pending -> Accepted | Rejected | Cancelled`.
/// Moderated: `Submitted -> Review -> Approved | Rejected | Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvitationStatus {
    /// Waiting on the invitee
    Pending,
    /// Invitee accepted
    Accepted,
    /// Invitee or reviewer rejected
    Rejected,
    /// Withdrawn before completion
    Cancelled,
    /// Request submitted, review not yet started
    Submitted,
    /// Waiting on a reviewer
    Review,
    /// Reviewer approved
    Approved,
}

impl InvitationStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::Rejected | Self::Cancelled | Self::Approved
        )
    }
}

fn required(task: &WorkflowTask, key: &str) -> InvitationResult<String> {
    task.property_str(key)
        .map(str::to_string)
        .ok_or_else(|| InvitationError::system(keys::MISSING_PROPERTY, [key, task.instance_id()]))
}

fn optional(task: &WorkflowTask, key: &str) -> String {
    task.property_str(key).unwrap_or_default().to_string()
}

fn resource_type(task: &WorkflowTask, key: &str) -> InvitationResult<ResourceType> {
    required(task, key)?.parse()
}

fn nominated_status(instance: &WorkflowInstance) -> InvitationStatus {
    match &instance.state {
        WorkflowInstanceState::Active => InvitationStatus::Pending,
        WorkflowInstanceState::Completed { transition } => match transition.as_deref() {
            Some(nominated::TRANSITION_ACCEPT) => InvitationStatus::Accepted,
            Some(nominated::TRANSITION_REJECT) => InvitationStatus::Rejected,
            _ => InvitationStatus::Cancelled,
        },
        WorkflowInstanceState::Cancelled => InvitationStatus::Cancelled,
    }
}

fn moderated_status(instance: &WorkflowInstance, in_review: bool) -> InvitationStatus {
    match &instance.state {
        WorkflowInstanceState::Active if in_review => InvitationStatus::Review,
        WorkflowInstanceState::Active => InvitationStatus::Submitted,
        WorkflowInstanceState::Completed { transition } => match transition.as_deref() {
            Some(moderated::TRANSITION_APPROVE) => InvitationStatus::Approved,
            Some(moderated::TRANSITION_REJECT) => InvitationStatus::Rejected,
            _ => InvitationStatus::Cancelled,
        },
        WorkflowInstanceState::Cancelled => InvitationStatus::Cancelled,
    }
}

/// Invitation sent by a site manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominatedInvitation {
    /// Workflow instance id
    pub invite_id: InvitationId,
    /// Invited user, possibly provisioned for this invitation
    pub invitee_user_name: UserName,
    /// Invitee first name
    pub invitee_first_name: String,
    /// Invitee last name
    pub invitee_last_name: String,
    /// Invitee mail address
    pub invitee_email: String,
    /// Site manager who sent the invitation
    pub inviter_user_name: UserName,
    /// Site role granted on acceptance
    pub role_name: String,
    /// Kind of resource joined
    pub resource_type: ResourceType,
    /// Site short name
    pub resource_name: String,
    /// Site title at the time of the invitation
    pub resource_title: String,
    /// Site description, truncated
    pub resource_description: String,
    /// Server the invitation links point at
    pub server_path: String,
    /// Accept page
    pub accept_url: String,
    /// Reject page
    pub reject_url: String,
    /// Secret the invitee must present to accept
    pub ticket: String,
    /// When the workflow started
    pub sent_invite_date: DateTime<Utc>,
    /// Lifecycle state derived from the workflow instance
    pub status: InvitationStatus,
}

impl NominatedInvitation {
    /// Rebuild from the start task of a nominated workflow
    pub fn from_start_task(start: &WorkflowTask) -> InvitationResult<Self> {
        let instance = &start.path.instance;
        Ok(Self {
            invite_id: InvitationId::parse(&instance.id)?,
            invitee_user_name: required(start, nominated::INVITEE_USER_NAME)?.into(),
            invitee_first_name: optional(start, nominated::INVITEE_FIRST_NAME),
            invitee_last_name: optional(start, nominated::INVITEE_LAST_NAME),
            invitee_email: optional(start, nominated::INVITEE_EMAIL),
            inviter_user_name: required(start, nominated::INVITER_USER_NAME)?.into(),
            role_name: required(start, nominated::INVITEE_ROLE)?,
            resource_type: resource_type(start, nominated::RESOURCE_TYPE)?,
            resource_name: required(start, nominated::RESOURCE_NAME)?,
            resource_title: optional(start, nominated::RESOURCE_TITLE),
            resource_description: optional(start, nominated::RESOURCE_DESCRIPTION),
            server_path: optional(start, nominated::SERVER_PATH),
            accept_url: optional(start, nominated::ACCEPT_URL),
            reject_url: optional(start, nominated::REJECT_URL),
            ticket: required(start, nominated::INVITE_TICKET)?,
            sent_invite_date: instance.start_date,
            status: nominated_status(instance),
        })
    }
}

/// Membership request reviewed by a site manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratedInvitation {
    /// Workflow instance id
    pub invite_id: InvitationId,
    /// User asking to join
    pub invitee_user_name: UserName,
    /// Site role asked for
    pub role_name: String,
    /// Kind of resource joined
    pub resource_type: ResourceType,
    /// Site short name
    pub resource_name: String,
    /// Latest comments of the invitee
    pub invitee_comments: String,
    /// Manager who ended the review
    pub reviewer: Option<UserName>,
    /// Comments left by the reviewer
    pub review_comments: Option<String>,
    /// When the request was made
    pub created_at: DateTime<Utc>,
    /// Last time the invitee edited the request
    pub modified_at: Option<DateTime<Utc>>,
    /// Lifecycle state derived from the workflow instance
    pub status: InvitationStatus,
}

impl ModeratedInvitation {
    /// Rebuild from the start task and, if known, the review task
    ///
    /// Review task properties win over the start task's, since the invitee
    /// and the reviewer both write to the review task.
    pub fn from_tasks(start: &WorkflowTask, review: Option<&WorkflowTask>) -> InvitationResult<Self> {
        let instance = &start.path.instance;
        let source = review.unwrap_or(start);
        let in_review = review.map_or(false, |task| task.outcome.is_none());
        let modified_at = source
            .property_str(moderated::MODIFIED_AT)
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|value| value.with_timezone(&Utc));

        Ok(Self {
            invite_id: InvitationId::parse(&instance.id)?,
            invitee_user_name: required(start, moderated::INVITEE_USER_NAME)?.into(),
            role_name: required(start, moderated::INVITEE_ROLE)?,
            resource_type: resource_type(start, moderated::RESOURCE_TYPE)?,
            resource_name: required(start, moderated::RESOURCE_NAME)?,
            invitee_comments: optional(source, moderated::INVITEE_COMMENTS),
            reviewer: review
                .and_then(|task| task.property_str(crate::model::bpm::OWNER))
                .map(UserName::from),
            review_comments: review
                .and_then(|task| task.property_str(moderated::REVIEW_COMMENTS))
                .map(str::to_string),
            created_at: instance.start_date,
            modified_at,
            status: moderated_status(&source.path.instance, in_review),
        })
    }
}

/// Either kind of invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invitation {
    /// Manager-initiated
    Nominated(NominatedInvitation),
    /// Invitee-initiated
    Moderated(ModeratedInvitation),
}

impl Invitation {
    /// Workflow instance id
    pub fn invite_id(&self) -> &InvitationId {
        match self {
            Self::Nominated(invitation) => &invitation.invite_id,
            Self::Moderated(invitation) => &invitation.invite_id,
        }
    }

    /// Invitation kind
    pub fn invitation_type(&self) -> InvitationType {
        match self {
            Self::Nominated(_) => InvitationType::Nominated,
            Self::Moderated(_) => InvitationType::Moderated,
        }
    }

    /// Invited or requesting user
    pub fn invitee_user_name(&self) -> &UserName {
        match self {
            Self::Nominated(invitation) => &invitation.invitee_user_name,
            Self::Moderated(invitation) => &invitation.invitee_user_name,
        }
    }

    /// Inviter, for nominated invitations only
    pub fn inviter_user_name(&self) -> Option<&UserName> {
        match self {
            Self::Nominated(invitation) => Some(&invitation.inviter_user_name),
            Self::Moderated(_) => None,
        }
    }

    /// Kind of resource joined
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Nominated(invitation) => invitation.resource_type,
            Self::Moderated(invitation) => invitation.resource_type,
        }
    }

    /// Site short name
    pub fn resource_name(&self) -> &str {
        match self {
            Self::Nominated(invitation) => &invitation.resource_name,
            Self::Moderated(invitation) => &invitation.resource_name,
        }
    }

    /// Site role granted on success
    pub fn role_name(&self) -> &str {
        match self {
            Self::Nominated(invitation) => &invitation.role_name,
            Self::Moderated(invitation) => &invitation.role_name,
        }
    }

    /// Lifecycle state
    pub fn status(&self) -> InvitationStatus {
        match self {
            Self::Nominated(invitation) => invitation.status,
            Self::Moderated(invitation) => invitation.status,
        }
    }

    /// The nominated invitation, if this is one
    pub fn as_nominated(&self) -> Option<&NominatedInvitation> {
        match self {
            Self::Nominated(invitation) => Some(invitation),
            Self::Moderated(_) => None,
        }
    }

    /// The moderated invitation, if this is one
    pub fn as_moderated(&self) -> Option<&ModeratedInvitation> {
        match self {
            Self::Moderated(invitation) => Some(invitation),
            Self::Nominated(_) => None,
        }
    }
}
