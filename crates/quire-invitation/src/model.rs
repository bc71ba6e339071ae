//! Workflow model names
//!
//! Property keys, task types, transitions and definition names shared by the
//! invitation processes. Engine-specific task and definition names live on
//! the [`crate::workflow`] adapters.

/// Generic BPM property keys
pub mod bpm {
    /// Human-readable description of a workflow instance
    pub const WORKFLOW_DESCRIPTION: &str = "bpm:workflowDescription";
    /// Assigned user
    pub const ASSIGNEE: &str = "bpm:assignee";
    /// Assigned group
    pub const GROUP_ASSIGNEE: &str = "bpm:groupAssignee";
    /// Owner of the task
    pub const OWNER: &str = "cm:owner";
}

/// Nominated invitation process
#[allow(missing_docs)]
pub mod nominated {
    /// Start task type
    pub const START_TASK: &str = "inwf:inviteToSiteTask";

    /// Transition out of the start task
    pub const TRANSITION_SEND_INVITE: &str = "sendInvite";
    /// Invitee accepts
    pub const TRANSITION_ACCEPT: &str = "accept";
    /// Invitee rejects
    pub const TRANSITION_REJECT: &str = "reject";
    /// Inviter or a manager cancels
    pub const TRANSITION_CANCEL: &str = "cancel";

    // Process property keys
    pub const INVITER_USER_NAME: &str = "inwf:inviterUserName";
    pub const INVITEE_USER_NAME: &str = "inwf:inviteeUserName";
    pub const INVITEE_FIRST_NAME: &str = "inwf:inviteeFirstName";
    pub const INVITEE_LAST_NAME: &str = "inwf:inviteeLastName";
    pub const INVITEE_EMAIL: &str = "inwf:inviteeEmail";
    pub const INVITEE_ROLE: &str = "inwf:inviteeRole";
    pub const INVITEE_GEN_PASSWORD: &str = "inwf:inviteeGenPassword";
    pub const RESOURCE_NAME: &str = "inwf:resourceName";
    pub const RESOURCE_TITLE: &str = "inwf:resourceTitle";
    pub const RESOURCE_DESCRIPTION: &str = "inwf:resourceDescription";
    pub const RESOURCE_TYPE: &str = "inwf:resourceType";
    pub const SERVER_PATH: &str = "inwf:serverPath";
    pub const ACCEPT_URL: &str = "inwf:acceptUrl";
    pub const REJECT_URL: &str = "inwf:rejectUrl";
    pub const INVITE_TICKET: &str = "inwf:inviteTicket";

    /// Mail template for the invite
    pub const MAIL_TEMPLATE: &str = "invite-email";
    /// Subject key for the invite mail
    pub const MAIL_SUBJECT: &str = "invitation.invitesender.email.subject";
}

/// Moderated invitation process
#[allow(missing_docs)]
pub mod moderated {
    /// Start task type
    pub const START_TASK: &str = "imwf:moderatedInvitationSubmitTask";

    /// Reviewer approves
    pub const TRANSITION_APPROVE: &str = "approve";
    /// Reviewer rejects
    pub const TRANSITION_REJECT: &str = "reject";

    // Process property keys
    pub const INVITEE_USER_NAME: &str = "imwf:inviteeUserName";
    pub const INVITEE_ROLE: &str = "imwf:inviteeRole";
    pub const INVITEE_COMMENTS: &str = "imwf:inviteeComments";
    pub const RESOURCE_NAME: &str = "imwf:resourceName";
    pub const RESOURCE_TYPE: &str = "imwf:resourceType";
    pub const REVIEW_COMMENTS: &str = "imwf:reviewComments";
    pub const MODIFIED_AT: &str = "imwf:modifiedAt";

    /// Mail template for the review request
    pub const MAIL_TEMPLATE: &str = "moderated-invite-email";
    /// Subject key for the review request
    pub const MAIL_SUBJECT: &str = "invitation.moderated.email.subject";
    /// Mail template for a rejection notice
    pub const REJECT_TEMPLATE: &str = "moderated-reject-email";
}

/// Longest site description copied into a nominated invitation
pub const MAX_RESOURCE_DESCRIPTION: usize = 255;
