//! Workflow engine adapters
//!
//! The same logical invitation processes are deployed on two BPM engines
//! that differ only in task type and definition names. Each engine gets one
//! [`InvitationWorkflow`] implementation, chosen once from configuration.

use crate::config::InvitationConfig;
use crate::criteria::InvitationSearchCriteria;
use crate::model::{moderated, nominated};
use quire_core::effects::{TaskProperties, TaskState, WorkflowTaskQuery};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Supported BPM engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowEngine {
    /// Activiti
    Activiti,
    /// jBPM
    Jbpm,
}

/// The three managed invitation processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvitationWorkflowType {
    /// Nominated invitation of an existing user
    Nominated,
    /// Nominated invitation of a provisioned user
    NominatedExternal,
    /// Moderated invitation
    Moderated,
}

/// Definition names of the managed processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowNames {
    /// Nominated invitation of an existing user
    pub nominated: String,
    /// Nominated invitation of a provisioned user
    pub nominated_external: String,
    /// Invitee-initiated request
    pub moderated: String,
}

impl WorkflowNames {
    /// Replace the names the configuration overrides
    fn with_overrides(mut self, config: &InvitationConfig) -> Self {
        if let Some(name) = &config.nominated_definition {
            self.nominated.clone_from(name);
        }
        if let Some(name) = &config.nominated_external_definition {
            self.nominated_external.clone_from(name);
        }
        if let Some(name) = &config.moderated_definition {
            self.moderated.clone_from(name);
        }
        self
    }
}

/// Engine-specific naming of the invitation processes
pub trait InvitationWorkflow: Send + Sync + fmt::Debug {
    /// Backing engine
    fn engine(&self) -> WorkflowEngine;

    /// Definition names in use
    fn names(&self) -> &WorkflowNames;

    /// Task type the invitee acts on in a nominated invitation
    fn pending_task(&self) -> &str;

    /// Task type managers act on in a moderated invitation
    fn review_task(&self) -> &str;

    /// Definition name for a process
    fn definition_name(&self, kind: InvitationWorkflowType) -> &str {
        let names = self.names();
        match kind {
            InvitationWorkflowType::Nominated => &names.nominated,
            InvitationWorkflowType::NominatedExternal => &names.nominated_external,
            InvitationWorkflowType::Moderated => &names.moderated,
        }
    }

    /// Distinct definition names, in declaration order
    fn workflow_names(&self) -> Vec<String> {
        let names = self.names();
        let mut all: Vec<String> = Vec::with_capacity(3);
        for name in [&names.nominated, &names.nominated_external, &names.moderated] {
            if !all.contains(name) {
                all.push(name.clone());
            }
        }
        all
    }

    /// Query for pending nominated tasks matching the criteria
    fn nominated_pending_query(
        &self,
        criteria: &InvitationSearchCriteria,
        limit: Option<usize>,
    ) -> WorkflowTaskQuery {
        let mut properties = TaskProperties::new();
        if let Some(inviter) = &criteria.inviter {
            properties.insert(nominated::INVITER_USER_NAME.into(), inviter.as_str().into());
        }
        if let Some(resource) = &criteria.resource_name {
            properties.insert(nominated::RESOURCE_NAME.into(), resource.as_str().into());
        }
        WorkflowTaskQuery {
            task_name: Some(self.pending_task().to_string()),
            state: Some(TaskState::InProgress),
            actor: criteria.invitee.as_ref().map(|invitee| invitee.as_str().to_string()),
            process_properties: properties,
            active_only: true,
            limit,
        }
    }

    /// Query for moderated review tasks matching the criteria
    fn moderated_review_query(
        &self,
        criteria: &InvitationSearchCriteria,
        limit: Option<usize>,
    ) -> WorkflowTaskQuery {
        let mut properties = TaskProperties::new();
        if let Some(invitee) = &criteria.invitee {
            properties.insert(moderated::INVITEE_USER_NAME.into(), invitee.as_str().into());
        }
        if let Some(resource) = &criteria.resource_name {
            properties.insert(moderated::RESOURCE_NAME.into(), resource.as_str().into());
        }
        WorkflowTaskQuery {
            task_name: Some(self.review_task().to_string()),
            state: Some(TaskState::InProgress),
            actor: None,
            process_properties: properties,
            active_only: true,
            limit,
        }
    }
}

/// Activiti process naming
#[derive(Debug, Clone)]
pub struct ActivitiInvitationWorkflow {
    names: WorkflowNames,
}

impl ActivitiInvitationWorkflow {
    /// Task the invitee acts on
    pub const PENDING_TASK: &'static str = "inwf:activitiInvitePendingTask";
    /// Task reviewers act on
    pub const REVIEW_TASK: &'static str = "imwf:activitiModeratedInvitationReviewTask";

    /// Adapter with the stock definition names
    pub fn new() -> Self {
        Self {
            names: WorkflowNames {
                nominated: "activiti$activitiInvitationNominatedAddDirect".to_string(),
                nominated_external: "activiti$activitiInvitationNominated".to_string(),
                moderated: "activiti$activitiInvitationModerated".to_string(),
            },
        }
    }
}

impl Default for ActivitiInvitationWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl InvitationWorkflow for ActivitiInvitationWorkflow {
    fn engine(&self) -> WorkflowEngine {
        WorkflowEngine::Activiti
    }

    fn names(&self) -> &WorkflowNames {
        &self.names
    }

    fn pending_task(&self) -> &str {
        Self::PENDING_TASK
    }

    fn review_task(&self) -> &str {
        Self::REVIEW_TASK
    }
}

/// jBPM process naming
#[derive(Debug, Clone)]
pub struct JbpmInvitationWorkflow {
    names: WorkflowNames,
}

impl JbpmInvitationWorkflow {
    /// Task the invitee acts on
    pub const PENDING_TASK: &'static str = "inwf:invitePendingTask";
    /// Task reviewers act on
    pub const REVIEW_TASK: &'static str = "imwf:moderatedInvitationReviewTask";

    /// Adapter with the stock definition names
    ///
    /// jBPM runs both nominated variants from one definition.
    pub fn new() -> Self {
        Self {
            names: WorkflowNames {
                nominated: "jbpm$inwf:invitation-nominated".to_string(),
                nominated_external: "jbpm$inwf:invitation-nominated".to_string(),
                moderated: "jbpm$imwf:invitation-moderated".to_string(),
            },
        }
    }
}

impl Default for JbpmInvitationWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl InvitationWorkflow for JbpmInvitationWorkflow {
    fn engine(&self) -> WorkflowEngine {
        WorkflowEngine::Jbpm
    }

    fn names(&self) -> &WorkflowNames {
        &self.names
    }

    fn pending_task(&self) -> &str {
        Self::PENDING_TASK
    }

    fn review_task(&self) -> &str {
        Self::REVIEW_TASK
    }
}

/// Adapter for the configured engine, with definition overrides applied
pub fn workflow_for_config(config: &InvitationConfig) -> Arc<dyn InvitationWorkflow> {
    match config.engine {
        WorkflowEngine::Activiti => {
            let mut adapter = ActivitiInvitationWorkflow::new();
            adapter.names = adapter.names.with_overrides(config);
            Arc::new(adapter)
        }
        WorkflowEngine::Jbpm => {
            let mut adapter = JbpmInvitationWorkflow::new();
            adapter.names = adapter.names.with_overrides(config);
            Arc::new(adapter)
        }
    }
}
