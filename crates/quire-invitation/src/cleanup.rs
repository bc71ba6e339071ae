//! Delete cascade
//!
//! Deleting a site or a person must not leave invitations pointing at it.
//! Planning is split from execution: [`InvitationService::on_before_delete`]
//! lists the [`CleanupAction`]s, [`InvitationService::apply_cleanup`] runs
//! them.
//!
//! Cancelling a nominated invitation may delete its provisioned invitee, and
//! deleting a person cancels their invitations. A [`CascadeGuard`] threaded
//! through the chain stops it from revisiting an instance or a person.

use crate::criteria::InvitationSearchCriteria;
use crate::error::InvitationResult;
use crate::id::InvitationId;
use crate::invitation::ResourceType;
use crate::service::InvitationService;
use quire_core::effects::{AsyncAction, InvitationEffects};
use quire_core::UserName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Node about to be deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletedNode {
    /// A site
    Site {
        /// Site short name
        short_name: String,
    },
    /// A person
    Person {
        /// User name of the person
        user_name: UserName,
    },
    /// Anything else
    Other,
}

/// Cleanup step planned for a deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanupAction {
    /// Queue cancellation of the workflow instances
    CancelWorkflowsAsync {
        /// Workflow instance ids
        workflow_ids: Vec<String>,
    },
    /// Cancel one invitation now, as the system user
    CancelInvitation {
        /// Invitation to cancel
        invite_id: InvitationId,
    },
}

/// Instances and people already handled in one cascade
#[derive(Debug, Clone, Default)]
pub struct CascadeGuard {
    instances: HashSet<String>,
    deleting: HashSet<UserName>,
}

impl CascadeGuard {
    /// Empty guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an instance; false if it was already recorded
    pub fn enter(&mut self, instance_id: &str) -> bool {
        self.instances.insert(instance_id.to_string())
    }

    /// Whether an instance was recorded
    pub fn visited(&self, instance_id: &str) -> bool {
        self.instances.contains(instance_id)
    }

    /// Record a person whose deletion is under way
    pub fn mark_deleting(&mut self, user: &UserName) {
        self.deleting.insert(user.clone());
    }

    /// Whether a person's deletion is under way
    pub fn is_deleting(&self, user: &UserName) -> bool {
        self.deleting.contains(user)
    }
}

impl<E: InvitationEffects> InvitationService<E> {
    /// Plan the cleanup for a node about to be deleted
    pub async fn on_before_delete(&self, node: &DeletedNode) -> InvitationResult<Vec<CleanupAction>> {
        match node {
            DeletedNode::Site { short_name } => {
                // Site deletion must go through even when the search fails.
                let pending = match self
                    .list_pending_invitations_for_resource(ResourceType::WebSite, short_name)
                    .await
                {
                    Ok(pending) => pending,
                    Err(err) => {
                        tracing::warn!(
                            site = %short_name,
                            error = %err,
                            "failed to list invitations of deleted site"
                        );
                        Vec::new()
                    }
                };
                if pending.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![CleanupAction::CancelWorkflowsAsync {
                    workflow_ids: pending
                        .iter()
                        .map(|invitation| invitation.invite_id().to_string())
                        .collect(),
                }])
            }
            DeletedNode::Person { user_name } => {
                let criteria = InvitationSearchCriteria::new().invitee(user_name.clone());
                Ok(self
                    .search_invitation_with_limit(&criteria, 0)
                    .await?
                    .into_iter()
                    .map(|invitation| CleanupAction::CancelInvitation {
                        invite_id: invitation.invite_id().clone(),
                    })
                    .collect())
            }
            DeletedNode::Other => Ok(Vec::new()),
        }
    }

    /// Run planned cleanup actions
    ///
    /// Every action is best-effort: failures are logged and the remaining
    /// actions still run.
    pub async fn apply_cleanup(
        &self,
        actions: Vec<CleanupAction>,
        guard: &mut CascadeGuard,
    ) -> InvitationResult<()> {
        for action in actions {
            match action {
                CleanupAction::CancelWorkflowsAsync { workflow_ids } => {
                    let count = workflow_ids.len();
                    tracing::info!(count, "queueing invitation cancellation");
                    if let Err(err) = self
                        .effects
                        .execute_async(AsyncAction::CancelWorkflows { workflow_ids })
                        .await
                    {
                        tracing::warn!(count, error = %err, "failed to queue invitation cancellation");
                    }
                }
                CleanupAction::CancelInvitation { invite_id } => {
                    let id = invite_id.to_string();
                    if let Err(err) = self.cancel_as(invite_id, UserName::system(), guard).await {
                        tracing::warn!(invite_id = %id, error = %err, "failed to cancel invitation during cleanup");
                    }
                }
            }
        }
        Ok(())
    }

    /// Cascade for a node about to be deleted
    pub async fn before_delete(&self, node: &DeletedNode) -> InvitationResult<()> {
        let mut guard = CascadeGuard::new();
        self.before_delete_with(node, &mut guard).await
    }

    pub(crate) async fn before_delete_with(
        &self,
        node: &DeletedNode,
        guard: &mut CascadeGuard,
    ) -> InvitationResult<()> {
        if let DeletedNode::Person { user_name } = node {
            guard.mark_deleting(user_name);
        }
        let actions = self.on_before_delete(node).await?;
        self.apply_cleanup(actions, guard).await
    }

    /// Run a queued asynchronous action, returning how many instances were cancelled
    ///
    /// Instances that already ended are skipped; failures are logged.
    pub async fn execute_async_action(&self, action: &AsyncAction) -> InvitationResult<usize> {
        let AsyncAction::CancelWorkflows { workflow_ids } = action;
        let mut cancelled = 0;
        for id in workflow_ids {
            match self.effects.get_instance(id).await {
                Ok(Some(instance)) if instance.is_active() => {
                    match self.effects.cancel_workflow(id).await {
                        Ok(_) => cancelled += 1,
                        Err(err) => {
                            tracing::warn!(workflow_id = %id, error = %err, "failed to cancel workflow");
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(workflow_id = %id, error = %err, "failed to load workflow");
                }
            }
        }
        tracing::info!(cancelled, requested = workflow_ids.len(), "cancelled invitation workflows");
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_records_once() {
        let mut guard = CascadeGuard::new();
        assert!(guard.enter("activiti$1"));
        assert!(!guard.enter("activiti$1"));
        assert!(guard.visited("activiti$1"));
        assert!(!guard.visited("activiti$2"));

        let bob = UserName::new("bob");
        assert!(!guard.is_deleting(&bob));
        guard.mark_deleting(&bob);
        assert!(guard.is_deleting(&bob));
    }
}
