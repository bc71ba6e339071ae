//! Shared fixture for invitation integration tests

#![allow(dead_code)]

use quire_core::effects::SITE_MANAGER_ROLE;
use quire_core::UserName;
use quire_invitation::model::{bpm, moderated, nominated};
use quire_invitation::{
    InvitationConfig, InvitationService, InvitationWorkflow, InvitationWorkflowType,
    NominatedInvitation, NominatedInviteRequest, UserNameGenerator,
};
use quire_testkit::{MockEffects, ProcessDefinition, TaskNode};
use std::sync::Arc;

pub const SITE: &str = "alpha";
pub const OTHER_SITE: &str = "beta";
pub const COLLABORATOR: &str = "SiteCollaborator";
pub const CONSUMER: &str = "SiteConsumer";

/// Two sites managed by `mary`, with the invitation processes deployed
pub struct SiteFixture {
    pub effects: Arc<MockEffects>,
    pub service: InvitationService<MockEffects>,
    pub manager: UserName,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self::with_config(InvitationConfig::default())
    }

    pub fn with_config(config: InvitationConfig) -> Self {
        let fixture = Self::undeployed(config);
        deploy_invitation_processes(&fixture.effects, fixture.service.workflow());
        fixture
    }

    /// Fixture whose workflow engine has no invitation processes
    pub fn undeployed(config: InvitationConfig) -> Self {
        quire_testkit::init_tracing();
        let effects = Arc::new(MockEffects::new());
        let service = InvitationService::new(Arc::clone(&effects), config).unwrap();

        effects.create_site(SITE, "Alpha Team", "Where alpha happens");
        effects.create_site(OTHER_SITE, "Beta Team", "");
        let manager = effects.add_user("mary", "Mary", "Major", "mary@example.org");
        effects.add_site_member(SITE, &manager, SITE_MANAGER_ROLE);
        effects.add_site_member(OTHER_SITE, &manager, SITE_MANAGER_ROLE);
        effects.set_current_user(manager.clone());

        Self {
            effects,
            service,
            manager,
        }
    }

    /// Invite a new person by name and mail address as the manager
    pub async fn invite_external(&self, first: &str, last: &str, email: &str, site: &str) -> NominatedInvitation {
        self.effects.set_current_user(self.manager.clone());
        self.service
            .invite_nominated(NominatedInviteRequest::external(first, last, email, site, COLLABORATOR))
            .await
            .unwrap()
    }

    /// Invite an existing user as the manager
    pub async fn invite_existing(&self, user: &UserName, site: &str) -> NominatedInvitation {
        self.effects.set_current_user(self.manager.clone());
        self.service
            .invite_nominated(NominatedInviteRequest::existing(user.clone(), site, CONSUMER))
            .await
            .unwrap()
    }
}

/// Deploy nominated and moderated processes under the adapter's names
pub fn deploy_invitation_processes(effects: &MockEffects, workflow: &dyn InvitationWorkflow) {
    let pending = workflow.pending_task();
    let mut nominated_names = vec![
        workflow.definition_name(InvitationWorkflowType::Nominated),
        workflow.definition_name(InvitationWorkflowType::NominatedExternal),
    ];
    nominated_names.dedup();
    for name in nominated_names {
        effects.deploy(
            ProcessDefinition::new(
                name,
                nominated::START_TASK,
                TaskNode::new()
                    .to(nominated::TRANSITION_SEND_INVITE, pending)
                    .by_default(nominated::TRANSITION_SEND_INVITE),
            )
            .task(
                pending,
                TaskNode::new()
                    .assigned_to(nominated::INVITEE_USER_NAME)
                    .ends(nominated::TRANSITION_ACCEPT)
                    .ends(nominated::TRANSITION_REJECT)
                    .ends(nominated::TRANSITION_CANCEL),
            ),
        );
    }

    let review = workflow.review_task();
    effects.deploy(
        ProcessDefinition::new(
            workflow.definition_name(InvitationWorkflowType::Moderated),
            moderated::START_TASK,
            TaskNode::new().to("submit", review).by_default("submit"),
        )
        .task(
            review,
            TaskNode::new()
                .assigned_to(bpm::GROUP_ASSIGNEE)
                .ends(moderated::TRANSITION_APPROVE)
                .ends(moderated::TRANSITION_REJECT),
        ),
    );
}

/// Always proposes the same user name
#[derive(Debug)]
pub struct FixedUserName(pub &'static str);

impl UserNameGenerator for FixedUserName {
    fn generate(&self, _first: &str, _last: &str, _email: &str, _attempt: usize) -> String {
        self.0.to_string()
    }
}
