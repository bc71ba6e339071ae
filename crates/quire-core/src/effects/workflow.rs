//! Workflow effects
//!
//! A minimal view of a BPM engine: definitions are started into instances,
//! each instance has a path carrying tasks, and tasks are ended along named
//! transitions. Property maps are JSON values keyed by qualified names.

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task and process variables
pub type TaskProperties = BTreeMap<String, serde_json::Value>;

/// A deployed process definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Engine-qualified definition id
    pub id: String,
    /// Engine-qualified definition name
    pub name: String,
}

/// Lifecycle of a workflow instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowInstanceState {
    /// Still running
    Active,
    /// Reached an end node along the given transition
    Completed {
        /// Transition taken out of the last task
        transition: Option<String>,
    },
    /// Cancelled before completion
    Cancelled,
}

/// A running or finished workflow instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Engine-qualified instance id (`<engine>$<local id>`)
    pub id: String,
    /// Definition the instance was started from
    pub definition: WorkflowDefinition,
    /// Time the instance started
    pub start_date: DateTime<Utc>,
    /// Time the instance ended
    pub end_date: Option<DateTime<Utc>>,
    /// Lifecycle state
    pub state: WorkflowInstanceState,
}

impl WorkflowInstance {
    /// Whether the instance is still running
    pub fn is_active(&self) -> bool {
        self.state == WorkflowInstanceState::Active
    }
}

/// Execution path of an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPath {
    /// Path id
    pub id: String,
    /// Owning instance
    pub instance: WorkflowInstance,
}

/// State of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Awaiting a transition
    InProgress,
    /// Ended
    Completed,
}

/// A workflow task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTask {
    /// Engine-qualified task id
    pub id: String,
    /// Task type name
    pub name: String,
    /// Path the task belongs to
    pub path: WorkflowPath,
    /// Task state
    pub state: TaskState,
    /// Assigned actor, if any
    pub actor: Option<String>,
    /// Task properties, including inherited process variables
    pub properties: TaskProperties,
    /// Transition the task was ended with
    pub outcome: Option<String>,
}

impl WorkflowTask {
    /// Id of the owning instance
    pub fn instance_id(&self) -> &str {
        &self.path.instance.id
    }

    /// String-valued property
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|value| value.as_str())
    }
}

/// Task query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTaskQuery {
    /// Restrict to a task type
    pub task_name: Option<String>,
    /// Restrict to a task state
    pub state: Option<TaskState>,
    /// Restrict to an assigned actor
    pub actor: Option<String>,
    /// Process variables that must match exactly
    pub process_properties: TaskProperties,
    /// Only tasks of active instances
    pub active_only: bool,
    /// Maximum number of tasks, `None` for no limit
    pub limit: Option<usize>,
}

/// Effect trait for a BPM engine
#[async_trait]
pub trait WorkflowEffects: Send + Sync {
    /// Look up a deployed definition by name
    async fn definition_by_name(&self, name: &str) -> Result<Option<WorkflowDefinition>>;

    /// Start an instance; its start task is left in progress
    async fn start_workflow(
        &self,
        definition_id: &str,
        properties: TaskProperties,
    ) -> Result<WorkflowPath>;

    /// Fetch an instance
    async fn get_instance(&self, instance_id: &str) -> Result<Option<WorkflowInstance>>;

    /// Start task of an instance
    async fn start_task(&self, instance_id: &str) -> Result<Option<WorkflowTask>>;

    /// Start tasks of several instances; unknown ids are skipped
    async fn start_tasks(&self, instance_ids: &[String]) -> Result<Vec<WorkflowTask>>;

    /// In-progress tasks on a path
    async fn tasks_for_path(&self, path_id: &str) -> Result<Vec<WorkflowTask>>;

    /// End a task along a transition, `None` taking the default
    async fn end_task(&self, task_id: &str, transition: Option<&str>) -> Result<WorkflowTask>;

    /// Merge properties into a task
    async fn update_task(&self, task_id: &str, properties: TaskProperties)
        -> Result<WorkflowTask>;

    /// Query tasks
    async fn query_tasks(&self, query: &WorkflowTaskQuery) -> Result<Vec<WorkflowTask>>;

    /// Cancel an instance
    async fn cancel_workflow(&self, instance_id: &str) -> Result<WorkflowInstance>;
}
