//! Invitation Service
//!
//! Facade over the nominated and moderated site invitation workflows.
//!
//! # Architecture
//!
//! 1. Preconditions (manager role, membership, invitee resolution) are checked
//!    against the effect handlers before any workflow is touched
//! 2. A workflow instance is started with every invitation property attached,
//!    and its start task is ended straight away
//! 3. Transitions end the single pending or review task of the instance;
//!    anything else means the invitation already finished
//! 4. The follow-up work of each transition (mail, account enabling, site
//!    membership, account cleanup) runs in [`crate::delegates`] after the
//!    engine has taken the transition
//!
//! Invitations are never cached: every read rebuilds them from workflow tasks.

use crate::cleanup::CascadeGuard;
use crate::config::InvitationConfig;
use crate::criteria::{InvitationSearchCriteria, InvitationTypeFilter};
use crate::error::{keys, InvitationError, InvitationResult};
use crate::generator::{
    generate_ticket, NameBasedUserNameGenerator, PasswordGenerator, RandomPasswordGenerator,
    UserNameGenerator,
};
use crate::id::InvitationId;
use crate::invitation::{
    Invitation, InvitationType, ModeratedInvitation, NominatedInvitation, ResourceType,
};
use crate::model::{bpm, moderated, nominated, MAX_RESOURCE_DESCRIPTION};
use crate::workflow::{workflow_for_config, InvitationWorkflow, InvitationWorkflowType};
use futures::future::BoxFuture;
use quire_core::config::QuireConfig;
use quire_core::effects::{
    InvitationEffects, Person, SiteInfo, TaskProperties, WorkflowDefinition, WorkflowTask,
    SITE_MANAGER_ROLE,
};
use quire_core::{QuireError, UserName};
use std::sync::Arc;
use std::time::Instant;

const PEOPLE_BY_EMAIL_LIMIT: usize = 100;

// ============================================================================
// Requests
// ============================================================================

/// Parameters of a nominated invitation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominatedInviteRequest {
    /// Existing invitee; when unset the invitee is found or provisioned by
    /// name and mail address
    pub invitee_user_name: Option<UserName>,
    /// Invitee first name, matched ignoring case
    pub invitee_first_name: String,
    /// Invitee last name, matched ignoring case
    pub invitee_last_name: String,
    /// Invitee mail address, matched ignoring case
    pub invitee_email: String,
    /// Site role granted on acceptance
    pub invitee_role: String,
    /// Kind of resource joined
    pub resource_type: ResourceType,
    /// Site short name
    pub resource_name: String,
    /// Falls back to the configured server path
    pub server_path: Option<String>,
    /// Page the invitee accepts on, relative to the server path
    pub accept_url: String,
    /// Page the invitee rejects on, relative to the server path
    pub reject_url: String,
}

impl NominatedInviteRequest {
    /// Invite an existing user
    pub fn existing(
        invitee: impl Into<UserName>,
        site: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            invitee_user_name: Some(invitee.into()),
            invitee_first_name: String::new(),
            invitee_last_name: String::new(),
            invitee_email: String::new(),
            invitee_role: role.into(),
            resource_type: ResourceType::WebSite,
            resource_name: site.into(),
            server_path: None,
            accept_url: "page/accept-invite".to_string(),
            reject_url: "page/reject-invite".to_string(),
        }
    }

    /// Invite someone by name and mail address
    pub fn external(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        site: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            invitee_user_name: None,
            invitee_first_name: first_name.into(),
            invitee_last_name: last_name.into(),
            invitee_email: email.into(),
            ..Self::existing(UserName::new(""), site, role)
        }
    }

    /// Override the accept and reject pages
    pub fn with_urls(mut self, accept_url: impl Into<String>, reject_url: impl Into<String>) -> Self {
        self.accept_url = accept_url.into();
        self.reject_url = reject_url.into();
        self
    }

    /// Override the server path
    pub fn with_server_path(mut self, server_path: impl Into<String>) -> Self {
        self.server_path = Some(server_path.into());
        self
    }
}

/// Parameters of a moderated invitation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeratedInviteRequest {
    /// User asking to join
    pub invitee_user_name: UserName,
    /// Free text shown to the reviewers
    pub invitee_comments: String,
    /// Site role asked for
    pub invitee_role: String,
    /// Kind of resource joined
    pub resource_type: ResourceType,
    /// Site short name
    pub resource_name: String,
}

impl ModeratedInviteRequest {
    /// Request to join a site
    pub fn new(
        invitee: impl Into<UserName>,
        site: impl Into<String>,
        role: impl Into<String>,
        comments: impl Into<String>,
    ) -> Self {
        Self {
            invitee_user_name: invitee.into(),
            invitee_comments: comments.into(),
            invitee_role: role.into(),
            resource_type: ResourceType::WebSite,
            resource_name: site.into(),
        }
    }
}

/// Invitee after lookup or provisioning
struct ResolvedInvitee {
    person: Person,
    /// Set when the account was provisioned for this invitation
    password: Option<String>,
}

fn put(properties: &mut TaskProperties, key: &str, value: impl Into<String>) {
    properties.insert(key.to_string(), serde_json::Value::String(value.into()));
}

fn instance_ids(tasks: &[WorkflowTask]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::with_capacity(tasks.len());
    for task in tasks {
        let id = task.instance_id();
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

// ============================================================================
// Service
// ============================================================================

/// Site invitation service
pub struct InvitationService<E> {
    pub(crate) effects: Arc<E>,
    pub(crate) workflow: Arc<dyn InvitationWorkflow>,
    pub(crate) config: InvitationConfig,
    user_names: Arc<dyn UserNameGenerator>,
    passwords: Arc<dyn PasswordGenerator>,
}

impl<E> Clone for InvitationService<E> {
    fn clone(&self) -> Self {
        Self {
            effects: Arc::clone(&self.effects),
            workflow: Arc::clone(&self.workflow),
            config: self.config.clone(),
            user_names: Arc::clone(&self.user_names),
            passwords: Arc::clone(&self.passwords),
        }
    }
}

impl<E: InvitationEffects> InvitationService<E> {
    /// Create a service for the configured workflow engine
    pub fn new(effects: Arc<E>, config: InvitationConfig) -> InvitationResult<Self> {
        config.validate()?;
        Ok(Self {
            effects,
            workflow: workflow_for_config(&config),
            config,
            user_names: Arc::new(NameBasedUserNameGenerator),
            passwords: Arc::new(RandomPasswordGenerator::default()),
        })
    }

    /// Replace the user name generator
    pub fn with_user_name_generator(mut self, generator: Arc<dyn UserNameGenerator>) -> Self {
        self.user_names = generator;
        self
    }

    /// Replace the password generator
    pub fn with_password_generator(mut self, generator: Arc<dyn PasswordGenerator>) -> Self {
        self.passwords = generator;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &InvitationConfig {
        &self.config
    }

    /// Workflow adapter in use
    pub fn workflow(&self) -> &dyn InvitationWorkflow {
        self.workflow.as_ref()
    }

    /// Definition names of the managed invitation workflows
    pub fn invitation_workflow_names(&self) -> Vec<String> {
        self.workflow.workflow_names()
    }

    // ========================================================================
    // Nominated invitations
    // ========================================================================

    /// Invite a user to a site on behalf of the current user, a site manager
    pub async fn invite_nominated(
        &self,
        request: NominatedInviteRequest,
    ) -> InvitationResult<NominatedInvitation> {
        let inviter = self.effects.current_user().await?;
        let site = self.require_site(&request.resource_name).await?;
        self.check_manager_role(&site.short_name, &inviter, keys::NOT_SITE_MANAGER)
            .await?;

        let invitee = self.resolve_invitee(&request).await?;
        let user = &invitee.person.user_name;
        if self.effects.is_member(&site.short_name, user).await? {
            return Err(InvitationError::user_error(
                keys::ALREADY_MEMBER,
                [user.as_str(), invitee.person.email.as_str(), site.short_name.as_str()],
            ));
        }
        if invitee.password.is_none() && !invitee.person.enabled {
            return Err(InvitationError::user_error(keys::USER_DISABLED, [user.as_str()]));
        }

        let kind = if invitee.password.is_some() {
            InvitationWorkflowType::NominatedExternal
        } else {
            InvitationWorkflowType::Nominated
        };
        let definition = self.definition(kind).await?;
        let server_path = request
            .server_path
            .clone()
            .unwrap_or_else(|| self.config.server_path.clone());
        let description: String = site
            .description
            .chars()
            .take(MAX_RESOURCE_DESCRIPTION)
            .collect();

        let mut properties = TaskProperties::new();
        put(&mut properties, nominated::INVITER_USER_NAME, inviter.as_str());
        put(&mut properties, nominated::INVITEE_USER_NAME, user.as_str());
        put(&mut properties, nominated::INVITEE_FIRST_NAME, invitee.person.first_name.as_str());
        put(&mut properties, nominated::INVITEE_LAST_NAME, invitee.person.last_name.as_str());
        put(&mut properties, nominated::INVITEE_EMAIL, invitee.person.email.as_str());
        put(&mut properties, nominated::INVITEE_ROLE, request.invitee_role.as_str());
        put(&mut properties, nominated::RESOURCE_TYPE, request.resource_type.as_str());
        put(&mut properties, nominated::RESOURCE_NAME, site.short_name.as_str());
        put(&mut properties, nominated::RESOURCE_TITLE, site.title.as_str());
        put(&mut properties, nominated::RESOURCE_DESCRIPTION, description);
        put(&mut properties, nominated::SERVER_PATH, server_path);
        put(&mut properties, nominated::ACCEPT_URL, request.accept_url.as_str());
        put(&mut properties, nominated::REJECT_URL, request.reject_url.as_str());
        put(&mut properties, nominated::INVITE_TICKET, generate_ticket());
        put(&mut properties, bpm::ASSIGNEE, user.as_str());
        put(
            &mut properties,
            bpm::WORKFLOW_DESCRIPTION,
            format!("Invitation to join {} site", site_label(&site)),
        );
        if let Some(password) = &invitee.password {
            put(&mut properties, nominated::INVITEE_GEN_PASSWORD, password.as_str());
        }

        let path = self.effects.start_workflow(&definition.id, properties).await?;
        let start = self.start_task_of(&path.id).await?;
        self.effects
            .end_task(&start.id, Some(nominated::TRANSITION_SEND_INVITE))
            .await?;

        let id = InvitationId::parse(&path.id)?;
        let invitation = self.nominated_invitation(&id).await?;
        self.send_nominated_invite(&invitation, invitee.password.as_deref())
            .await?;

        tracing::info!(
            invite_id = %id,
            site = %site.short_name,
            inviter = %inviter,
            invitee = %user,
            provisioned = invitee.password.is_some(),
            "nominated invitation sent"
        );
        Ok(invitation)
    }

    /// Accept a nominated invitation with the ticket it was issued with
    pub async fn accept(&self, invite_id: &str, ticket: &str) -> InvitationResult<Invitation> {
        let id = InvitationId::parse(invite_id)?;
        let invitation = self.nominated_invitation(&id).await?;
        if invitation.ticket != ticket {
            tracing::warn!(invite_id = %id, "accept attempted with a foreign ticket");
            return Err(InvitationError::forbidden(keys::INVALID_TICKET, [id.as_str()]));
        }

        let mut guard = CascadeGuard::new();
        let pending = self.workflow.pending_task().to_string();
        if self
            .end_invitation(&id, &pending, nominated::TRANSITION_ACCEPT, None, &mut guard)
            .await?
            .is_some()
        {
            self.on_nominated_accept(&invitation).await?;
        }

        tracing::info!(invite_id = %id, invitee = %invitation.invitee_user_name, "invitation accepted");
        self.get_invitation_by_id(&id).await
    }

    // ========================================================================
    // Moderated invitations
    // ========================================================================

    /// Ask to join a site; site managers review the request
    pub async fn invite_moderated(
        &self,
        request: ModeratedInviteRequest,
    ) -> InvitationResult<ModeratedInvitation> {
        let site = self.require_site(&request.resource_name).await?;
        let invitee = &request.invitee_user_name;
        if !self.effects.person_exists(invitee).await? {
            return Err(InvitationError::not_found(keys::PERSON_NOT_FOUND, [invitee.as_str()]));
        }
        if self.effects.is_member(&site.short_name, invitee).await? {
            return Err(InvitationError::user_error(
                keys::ALREADY_MEMBER,
                [invitee.as_str(), site.short_name.as_str()],
            ));
        }

        let definition = self.definition(InvitationWorkflowType::Moderated).await?;
        let managers = self
            .effects
            .site_role_group(&site.short_name, SITE_MANAGER_ROLE)
            .await?;

        let mut properties = TaskProperties::new();
        put(&mut properties, moderated::INVITEE_USER_NAME, invitee.as_str());
        put(&mut properties, moderated::INVITEE_ROLE, request.invitee_role.as_str());
        put(&mut properties, moderated::INVITEE_COMMENTS, request.invitee_comments.as_str());
        put(&mut properties, moderated::RESOURCE_TYPE, request.resource_type.as_str());
        put(&mut properties, moderated::RESOURCE_NAME, site.short_name.as_str());
        put(&mut properties, bpm::GROUP_ASSIGNEE, managers.as_str());
        put(
            &mut properties,
            bpm::WORKFLOW_DESCRIPTION,
            format!("Request to join {} site", site_label(&site)),
        );

        let path = self.effects.start_workflow(&definition.id, properties).await?;
        let start = self.start_task_of(&path.id).await?;
        self.effects.end_task(&start.id, None).await?;

        let id = InvitationId::parse(&path.id)?;
        let invitation = self.moderated_invitation(&id).await?;
        self.send_moderated_invite(&invitation, &managers, &site).await?;

        tracing::info!(invite_id = %id, site = %site.short_name, invitee = %invitee, "moderated invitation submitted");
        Ok(invitation)
    }

    /// Approve a moderated invitation as a site manager
    pub async fn approve(&self, invite_id: &str, reason: Option<&str>) -> InvitationResult<Invitation> {
        let id = InvitationId::parse(invite_id)?;
        match self.get_invitation_by_id(&id).await? {
            Invitation::Moderated(invitation) => {
                let mut guard = CascadeGuard::new();
                self.review(&id, &invitation, moderated::TRANSITION_APPROVE, reason, &mut guard)
                    .await
            }
            Invitation::Nominated(_) => Err(InvitationError::user_error(
                keys::WRONG_TYPE,
                [id.as_str(), "approve"],
            )),
        }
    }

    /// Update the invitee's comments on a moderated invitation under review
    pub async fn update_moderated_invitation(
        &self,
        invitee: &UserName,
        site: &str,
        comments: Option<&str>,
    ) -> InvitationResult<ModeratedInvitation> {
        let criteria = InvitationSearchCriteria::new()
            .invitee(invitee.clone())
            .resource(ResourceType::WebSite, site)
            .invitation_type(InvitationTypeFilter::Moderated);
        let query = self.workflow.moderated_review_query(&criteria, Some(1));
        let review = self
            .effects
            .query_tasks(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                InvitationError::not_found(keys::NOT_FOUND_BY_INVITEE, [invitee.as_str(), site])
            })?;

        let mut properties = TaskProperties::new();
        if let Some(comments) = comments {
            put(&mut properties, moderated::INVITEE_COMMENTS, comments);
        }
        let now = self.effects.physical_time().await?;
        put(&mut properties, moderated::MODIFIED_AT, now.to_rfc3339());

        let review = self.effects.update_task(&review.id, properties).await?;
        let start = self.start_task_of(review.instance_id()).await?;
        tracing::debug!(invite_id = %review.instance_id(), invitee = %invitee, "moderated invitation updated");
        ModeratedInvitation::from_tasks(&start, Some(&review))
    }

    async fn review(
        &self,
        id: &InvitationId,
        invitation: &ModeratedInvitation,
        transition: &str,
        comments: Option<&str>,
        guard: &mut CascadeGuard,
    ) -> InvitationResult<Invitation> {
        let reviewer = self.effects.current_user().await?;
        self.check_manager_role(&invitation.resource_name, &reviewer, keys::NOT_SITE_MANAGER)
            .await?;

        let mut properties = TaskProperties::new();
        put(&mut properties, bpm::OWNER, reviewer.as_str());
        if let Some(comments) = comments {
            put(&mut properties, moderated::REVIEW_COMMENTS, comments);
        }
        let review_task = self.workflow.review_task().to_string();
        let Some(ended) = self
            .end_invitation(id, &review_task, transition, Some(properties), guard)
            .await?
        else {
            return self.get_invitation_by_id(id).await;
        };

        if transition == moderated::TRANSITION_APPROVE {
            self.on_moderated_approve(invitation, &reviewer).await?;
        } else {
            self.on_moderated_reject(invitation, &reviewer, comments).await;
        }

        tracing::info!(invite_id = %id, reviewer = %reviewer, transition, "moderated invitation reviewed");
        let start = self.start_task_of(id.as_str()).await?;
        Ok(Invitation::Moderated(ModeratedInvitation::from_tasks(
            &start,
            Some(&ended),
        )?))
    }

    // ========================================================================
    // Shared transitions
    // ========================================================================

    /// Reject an invitation
    ///
    /// Nominated invitations are rejected by the invitee; moderated ones by a
    /// site manager, with `reason` recorded as review comments.
    pub async fn reject(&self, invite_id: &str, reason: Option<&str>) -> InvitationResult<Invitation> {
        let id = InvitationId::parse(invite_id)?;
        let mut guard = CascadeGuard::new();
        match self.get_invitation_by_id(&id).await? {
            Invitation::Nominated(invitation) => {
                let pending = self.workflow.pending_task().to_string();
                if self
                    .end_invitation(&id, &pending, nominated::TRANSITION_REJECT, None, &mut guard)
                    .await?
                    .is_some()
                {
                    self.delete_authentication_if_unused(&invitation.invitee_user_name, &mut guard)
                        .await;
                }
                tracing::info!(invite_id = %id, invitee = %invitation.invitee_user_name, "invitation rejected");
                self.get_invitation_by_id(&id).await
            }
            Invitation::Moderated(invitation) => {
                self.review(&id, &invitation, moderated::TRANSITION_REJECT, reason, &mut guard)
                    .await
            }
        }
    }

    /// Cancel an invitation as the current user
    ///
    /// Returns `None` when no such invitation exists.
    pub async fn cancel(&self, invite_id: &str) -> InvitationResult<Option<Invitation>> {
        let id = InvitationId::parse(invite_id)?;
        let acting = self.effects.current_user().await?;
        let mut guard = CascadeGuard::new();
        self.cancel_as(id, acting, &mut guard).await
    }

    pub(crate) fn cancel_as<'a>(
        &'a self,
        id: InvitationId,
        acting: UserName,
        guard: &'a mut CascadeGuard,
    ) -> BoxFuture<'a, InvitationResult<Option<Invitation>>> {
        Box::pin(async move {
            let invitation = match self.get_invitation_by_id(&id).await {
                Ok(invitation) => invitation,
                Err(err) if err.is_not_found() => {
                    tracing::debug!(invite_id = %id, "nothing to cancel");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            };

            match &invitation {
                Invitation::Moderated(details) => {
                    let allowed = acting.is_system()
                        || acting == details.invitee_user_name
                        || self.is_site_manager(&details.resource_name, &acting).await?;
                    if !allowed {
                        return Err(InvitationError::forbidden(
                            keys::CANCEL_NOT_SITE_MANAGER,
                            [acting.as_str(), id.as_str()],
                        ));
                    }
                    if self.effects.get_site(&details.resource_name).await?.is_some()
                        && guard.enter(id.as_str())
                    {
                        if details.status.is_terminal() {
                            return Err(InvitationError::user_error(
                                keys::ALREADY_FINISHED,
                                [id.as_str()],
                            ));
                        }
                        self.effects.cancel_workflow(id.as_str()).await?;
                    }
                }
                Invitation::Nominated(details) => {
                    let allowed = acting.is_system()
                        || acting == details.inviter_user_name
                        || self.is_site_manager(&details.resource_name, &acting).await?;
                    if !allowed {
                        return Err(InvitationError::forbidden(
                            keys::CANCEL_NOT_SITE_MANAGER,
                            [acting.as_str(), id.as_str()],
                        ));
                    }
                    if self.effects.get_site(&details.resource_name).await?.is_some() {
                        let pending = self.workflow.pending_task().to_string();
                        if self
                            .end_invitation(&id, &pending, nominated::TRANSITION_CANCEL, None, guard)
                            .await?
                            .is_some()
                        {
                            self.delete_authentication_if_unused(&details.invitee_user_name, guard)
                                .await;
                        }
                    }
                }
            }

            tracing::info!(invite_id = %id, acting = %acting, "invitation cancelled");
            Ok(Some(self.get_invitation_by_id(&id).await?))
        })
    }

    /// End the single task awaiting a transition on an invitation
    ///
    /// Returns `None` when the instance was already visited in this cascade.
    pub(crate) async fn end_invitation(
        &self,
        id: &InvitationId,
        expected_task: &str,
        transition: &str,
        properties: Option<TaskProperties>,
        guard: &mut CascadeGuard,
    ) -> InvitationResult<Option<WorkflowTask>> {
        if !guard.enter(id.as_str()) {
            tracing::debug!(invite_id = %id, transition, "invitation already handled in this cascade");
            return Ok(None);
        }

        let tasks = self.effects.tasks_for_path(id.as_str()).await?;
        let task = match tasks.as_slice() {
            [task] if task.name == expected_task => task,
            _ => {
                return Err(InvitationError::user_error(
                    keys::ALREADY_FINISHED,
                    [id.as_str()],
                ))
            }
        };

        if let Some(properties) = properties {
            self.effects.update_task(&task.id, properties).await?;
        }
        let ended = self.effects.end_task(&task.id, Some(transition)).await?;
        tracing::debug!(invite_id = %id, task = %ended.id, transition, "ended invitation task");
        Ok(Some(ended))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up an invitation by id
    pub async fn get_invitation(&self, invite_id: &str) -> InvitationResult<Invitation> {
        let id = InvitationId::parse(invite_id)?;
        self.get_invitation_by_id(&id).await
    }

    pub(crate) async fn get_invitation_by_id(&self, id: &InvitationId) -> InvitationResult<Invitation> {
        let start = self
            .effects
            .start_task(id.as_str())
            .await?
            .ok_or_else(|| InvitationError::not_found(keys::NOT_FOUND, [id.as_str()]))?;

        if start.name == nominated::START_TASK {
            Ok(Invitation::Nominated(NominatedInvitation::from_start_task(&start)?))
        } else if start.name == moderated::START_TASK {
            let review = self
                .effects
                .tasks_for_path(id.as_str())
                .await?
                .into_iter()
                .find(|task| task.name == self.workflow.review_task());
            Ok(Invitation::Moderated(ModeratedInvitation::from_tasks(
                &start,
                review.as_ref(),
            )?))
        } else {
            Err(InvitationError::not_found(keys::NOT_FOUND, [id.as_str()]))
        }
    }

    async fn nominated_invitation(&self, id: &InvitationId) -> InvitationResult<NominatedInvitation> {
        match self.get_invitation_by_id(id).await? {
            Invitation::Nominated(invitation) => Ok(invitation),
            Invitation::Moderated(_) => Err(InvitationError::user_error(
                keys::WRONG_TYPE,
                [id.as_str(), "nominated"],
            )),
        }
    }

    async fn moderated_invitation(&self, id: &InvitationId) -> InvitationResult<ModeratedInvitation> {
        match self.get_invitation_by_id(id).await? {
            Invitation::Moderated(invitation) => Ok(invitation),
            Invitation::Nominated(_) => Err(InvitationError::user_error(
                keys::WRONG_TYPE,
                [id.as_str(), "moderated"],
            )),
        }
    }

    /// Pending invitations to a resource
    pub async fn list_pending_invitations_for_resource(
        &self,
        resource_type: ResourceType,
        resource_name: &str,
    ) -> InvitationResult<Vec<Invitation>> {
        let criteria = InvitationSearchCriteria::new().resource(resource_type, resource_name);
        self.search_invitation_with_limit(&criteria, 0).await
    }

    /// Pending invitations of an invitee, optionally for one resource type
    pub async fn list_pending_invitations_for_invitee(
        &self,
        invitee: &UserName,
        resource_type: Option<ResourceType>,
    ) -> InvitationResult<Vec<Invitation>> {
        let mut criteria = InvitationSearchCriteria::new().invitee(invitee.clone());
        criteria.resource_type = resource_type;
        self.search_invitation_with_limit(&criteria, 0).await
    }

    /// Pending invitations matching the criteria, capped at the configured limit
    pub async fn search_invitation(
        &self,
        criteria: &InvitationSearchCriteria,
    ) -> InvitationResult<Vec<Invitation>> {
        self.search_invitation_with_limit(criteria, self.config.search_limit)
            .await
    }

    /// Pending invitations matching the criteria; a zero limit means no limit
    pub async fn search_invitation_with_limit(
        &self,
        criteria: &InvitationSearchCriteria,
        limit: usize,
    ) -> InvitationResult<Vec<Invitation>> {
        let started = Instant::now();
        let limit = (limit > 0).then_some(limit);
        let mut results = Vec::new();

        if criteria.invitation_type.includes(InvitationType::Nominated) {
            let query = self.workflow.nominated_pending_query(criteria, limit);
            let pending = self.effects.query_tasks(&query).await?;
            for start in self.effects.start_tasks(&instance_ids(&pending)).await? {
                results.push(Invitation::Nominated(NominatedInvitation::from_start_task(&start)?));
            }
        }

        // Moderated invitations have no inviter.
        if criteria.invitation_type.includes(InvitationType::Moderated) && criteria.inviter.is_none() {
            let query = self.workflow.moderated_review_query(criteria, limit);
            let reviews = self.effects.query_tasks(&query).await?;
            for start in self.effects.start_tasks(&instance_ids(&reviews)).await? {
                let review = reviews
                    .iter()
                    .find(|task| task.instance_id() == start.instance_id());
                results.push(Invitation::Moderated(ModeratedInvitation::from_tasks(
                    &start, review,
                )?));
            }
        }

        results.retain(|invitation| criteria.matches(invitation));
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        tracing::debug!(
            found = results.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "invitation search"
        );
        Ok(results)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn require_site(&self, site: &str) -> InvitationResult<SiteInfo> {
        self.effects
            .get_site(site)
            .await?
            .ok_or_else(|| InvitationError::not_found(keys::SITE_NOT_FOUND, [site]))
    }

    async fn definition(&self, kind: InvitationWorkflowType) -> InvitationResult<WorkflowDefinition> {
        let name = self.workflow.definition_name(kind);
        self.effects
            .definition_by_name(name)
            .await?
            .ok_or_else(|| InvitationError::system(keys::NO_WORKFLOW, [name]))
    }

    async fn start_task_of(&self, instance_id: &str) -> InvitationResult<WorkflowTask> {
        self.effects
            .start_task(instance_id)
            .await?
            .ok_or_else(|| InvitationError::not_found(keys::NOT_FOUND, [instance_id]))
    }

    pub(crate) async fn is_site_manager(&self, site: &str, user: &UserName) -> InvitationResult<bool> {
        Ok(self.effects.members_role(site, user).await?.as_deref() == Some(SITE_MANAGER_ROLE))
    }

    async fn check_manager_role(&self, site: &str, user: &UserName, key: &str) -> InvitationResult<()> {
        if self.is_site_manager(site, user).await? {
            Ok(())
        } else {
            Err(InvitationError::forbidden(key, [user.as_str(), site]))
        }
    }

    /// Existing person named by the request, or a freshly provisioned one
    async fn resolve_invitee(&self, request: &NominatedInviteRequest) -> InvitationResult<ResolvedInvitee> {
        let existing = match &request.invitee_user_name {
            Some(user) => Some(
                self.effects
                    .get_person(user)
                    .await?
                    .ok_or_else(|| InvitationError::not_found(keys::PERSON_NOT_FOUND, [user.as_str()]))?,
            ),
            None => self
                .effects
                .people_by_email(&request.invitee_email, PEOPLE_BY_EMAIL_LIMIT)
                .await?
                .into_iter()
                .find(|person| {
                    person.email.eq_ignore_ascii_case(&request.invitee_email)
                        && person.first_name.eq_ignore_ascii_case(&request.invitee_first_name)
                        && person.last_name.eq_ignore_ascii_case(&request.invitee_last_name)
                }),
        };
        match existing {
            Some(person) => Ok(ResolvedInvitee {
                person,
                password: None,
            }),
            None => self.provision_invitee(request).await,
        }
    }

    /// Create an annullable person with a disabled account
    async fn provision_invitee(&self, request: &NominatedInviteRequest) -> InvitationResult<ResolvedInvitee> {
        if !self.effects.authentication_creation_allowed().await? {
            return Err(InvitationError::system(
                keys::AUTHENTICATION_CHAIN,
                [request.invitee_email.as_str()],
            ));
        }

        let person = self
            .create_invitee_person(
                &request.invitee_first_name,
                &request.invitee_last_name,
                &request.invitee_email,
            )
            .await?;
        let password = self.passwords.generate();
        self.effects
            .create_authentication(&person.user_name, &password)
            .await?;
        self.effects
            .set_authentication_enabled(&person.user_name, false)
            .await?;

        tracing::info!(invitee = %person.user_name, "provisioned invitee account");
        Ok(ResolvedInvitee {
            person,
            password: Some(password),
        })
    }

    async fn create_invitee_person(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> InvitationResult<Person> {
        for attempt in 0..self.config.max_user_name_retries {
            let candidate = UserName::new(self.user_names.generate(first_name, last_name, email, attempt));
            if self.effects.person_exists(&candidate).await?
                || self.effects.authentication_exists(&candidate).await?
            {
                tracing::debug!(candidate = %candidate, attempt, "generated user name taken");
                continue;
            }

            let person = Person {
                annullable: true,
                ..Person::new(candidate, first_name, last_name, email)
            };
            match self.effects.create_person(person.clone()).await {
                Ok(()) => return Ok(person),
                Err(QuireError::Invalid { message }) => {
                    tracing::debug!(attempt, %message, "generated user name claimed concurrently");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(InvitationError::system(
            keys::UNABLE_GENERATE_ID,
            [first_name, last_name, email],
        ))
    }
}

fn site_label(site: &SiteInfo) -> &str {
    if site.title.is_empty() {
        &site.short_name
    } else {
        &site.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::effects::{TaskState, WorkflowDefinition, WorkflowInstance, WorkflowInstanceState, WorkflowPath};
    use chrono::Utc;

    fn task(instance: &str) -> WorkflowTask {
        WorkflowTask {
            id: format!("{instance}-task"),
            name: "t".into(),
            path: WorkflowPath {
                id: instance.into(),
                instance: WorkflowInstance {
                    id: instance.into(),
                    definition: WorkflowDefinition {
                        id: "d".into(),
                        name: "d".into(),
                    },
                    start_date: Utc::now(),
                    end_date: None,
                    state: WorkflowInstanceState::Active,
                },
            },
            state: TaskState::InProgress,
            actor: None,
            properties: TaskProperties::new(),
            outcome: None,
        }
    }

    #[test]
    fn test_instance_ids_dedupe_in_order() {
        let tasks = [task("a$2"), task("a$1"), task("a$2")];
        assert_eq!(instance_ids(&tasks), vec!["a$2".to_string(), "a$1".to_string()]);
    }

    #[test]
    fn test_external_request_has_no_user_name() {
        let request = NominatedInviteRequest::external("Ann", "Lee", "ann@x.org", "alpha", "SiteConsumer");
        assert!(request.invitee_user_name.is_none());
        assert_eq!(request.invitee_email, "ann@x.org");
        assert_eq!(request.accept_url, "page/accept-invite");

        let existing = NominatedInviteRequest::existing("bob", "alpha", "SiteConsumer")
            .with_server_path("https://share.example.org");
        assert_eq!(existing.invitee_user_name, Some(UserName::new("bob")));
        assert_eq!(existing.server_path.as_deref(), Some("https://share.example.org"));
    }
}
