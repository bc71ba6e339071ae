//! In-memory workflow engine
//!
//! Process definitions are small task graphs: each task node maps transition
//! names to the next task, or to `None` for the end of the process. Starting
//! an instance leaves its start task in progress; ending the last task
//! completes the instance along that transition.
//!
//! Ids follow the `<engine>$<n>` shape, with the engine taken from the
//! definition name prefix.

use crate::mock_effects::MockState;
use crate::MockEffects;
use async_trait::async_trait;
use indexmap::IndexMap;
use quire_core::effects::{
    TaskProperties, TaskState, WorkflowDefinition, WorkflowEffects, WorkflowInstance,
    WorkflowInstanceState, WorkflowPath, WorkflowTask, WorkflowTaskQuery,
};
use quire_core::{QuireError, Result};
use std::collections::BTreeMap;

/// A task node in a process graph
#[derive(Debug, Clone, Default)]
pub struct TaskNode {
    /// Process variable naming the assignee
    pub actor_property: Option<String>,
    /// Transition name to next task, `None` ending the process
    pub transitions: BTreeMap<String, Option<String>>,
    /// Transition taken when ending without one
    pub default_transition: Option<String>,
}

impl TaskNode {
    /// Node with no transitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign tasks to the actor named by a process variable
    pub fn assigned_to(mut self, property: &str) -> Self {
        self.actor_property = Some(property.to_string());
        self
    }

    /// Add a transition to another task
    pub fn to(mut self, transition: &str, task: &str) -> Self {
        self.transitions
            .insert(transition.to_string(), Some(task.to_string()));
        self
    }

    /// Add a transition ending the process
    pub fn ends(mut self, transition: &str) -> Self {
        self.transitions.insert(transition.to_string(), None);
        self
    }

    /// Make a transition the default
    pub fn by_default(mut self, transition: &str) -> Self {
        self.default_transition = Some(transition.to_string());
        self
    }
}

/// A deployable process definition
#[derive(Debug, Clone)]
pub struct ProcessDefinition {
    /// Engine-qualified name, e.g. `activiti$invite`
    pub name: String,
    /// Type name of the start task
    pub start_task: String,
    /// Task nodes by type name
    pub tasks: BTreeMap<String, TaskNode>,
}

impl ProcessDefinition {
    /// Definition with the given start task node
    pub fn new(name: &str, start_task: &str, start: TaskNode) -> Self {
        let mut tasks = BTreeMap::new();
        tasks.insert(start_task.to_string(), start);
        Self {
            name: name.to_string(),
            start_task: start_task.to_string(),
            tasks,
        }
    }

    /// Add a task node
    pub fn task(mut self, name: &str, node: TaskNode) -> Self {
        self.tasks.insert(name.to_string(), node);
        self
    }

    fn engine(&self) -> &str {
        self.name.split('$').next().unwrap_or("mock")
    }
}

#[derive(Debug, Default)]
pub(crate) struct WorkflowState {
    definitions: BTreeMap<String, (WorkflowDefinition, ProcessDefinition)>,
    instances: IndexMap<String, InstanceRecord>,
    tasks: IndexMap<String, TaskRecord>,
    counter: u64,
    fail_queries: bool,
}

#[derive(Debug)]
struct InstanceRecord {
    instance: WorkflowInstance,
    variables: TaskProperties,
}

#[derive(Debug)]
struct TaskRecord {
    name: String,
    instance_id: String,
    state: TaskState,
    actor: Option<String>,
    local: TaskProperties,
    outcome: Option<String>,
}

impl WorkflowState {
    fn next_id(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    fn definition_for(&self, instance: &WorkflowInstance) -> Result<&ProcessDefinition> {
        self.definitions
            .get(&instance.definition.id)
            .map(|(_, process)| process)
            .ok_or_else(|| QuireError::internal(format!("definition {} missing", instance.definition.id)))
    }

    fn instance(&self, id: &str) -> Result<&InstanceRecord> {
        self.instances
            .get(id)
            .ok_or_else(|| QuireError::not_found(format!("workflow instance {id}")))
    }

    fn view(&self, id: &str, task: &TaskRecord) -> Option<WorkflowTask> {
        let record = self.instances.get(&task.instance_id)?;
        let mut properties = record.variables.clone();
        properties.extend(task.local.clone());
        Some(WorkflowTask {
            id: id.to_string(),
            name: task.name.clone(),
            path: WorkflowPath {
                id: record.instance.id.clone(),
                instance: record.instance.clone(),
            },
            state: task.state,
            actor: task.actor.clone(),
            properties,
            outcome: task.outcome.clone(),
        })
    }

    fn create_task(&mut self, instance_id: &str, name: &str, actor: Option<String>, start: bool) -> Result<String> {
        let engine = instance_id.split('$').next().unwrap_or("mock").to_string();
        let n = self.next_id();
        let id = if start {
            format!("{engine}$start{n}")
        } else {
            format!("{engine}${n}")
        };
        self.tasks.insert(
            id.clone(),
            TaskRecord {
                name: name.to_string(),
                instance_id: instance_id.to_string(),
                state: TaskState::InProgress,
                actor,
                local: TaskProperties::new(),
                outcome: None,
            },
        );
        Ok(id)
    }
}

impl MockEffects {
    /// Deploy a process definition
    pub fn deploy(&self, process: ProcessDefinition) -> WorkflowDefinition {
        let definition = WorkflowDefinition {
            id: format!("{}:1", process.name),
            name: process.name.clone(),
        };
        self.state
            .lock()
            .workflow
            .definitions
            .insert(definition.id.clone(), (definition.clone(), process));
        definition
    }

    /// Every task ever created, in creation order
    pub fn all_tasks(&self) -> Vec<WorkflowTask> {
        let state = self.state.lock();
        state
            .workflow
            .tasks
            .iter()
            .filter_map(|(id, task)| state.workflow.view(id, task))
            .collect()
    }

    /// Make subsequent task queries fail
    pub fn fail_task_queries(&self, fail: bool) {
        self.state.lock().workflow.fail_queries = fail;
    }
}

fn end_task(state: &mut MockState, task_id: &str, transition: Option<&str>) -> Result<WorkflowTask> {
    let now = state.tick();
    let workflow = &mut state.workflow;

    let (task_name, instance_id) = {
        let task = workflow
            .tasks
            .get(task_id)
            .ok_or_else(|| QuireError::not_found(format!("task {task_id}")))?;
        if task.state != TaskState::InProgress {
            return Err(QuireError::invalid(format!("task {task_id} already ended")));
        }
        (task.name.clone(), task.instance_id.clone())
    };

    let record = workflow.instance(&instance_id)?;
    let process = workflow.definition_for(&record.instance)?;
    let node = process
        .tasks
        .get(&task_name)
        .ok_or_else(|| QuireError::internal(format!("task node {task_name} missing")))?;
    let transition = transition
        .map(str::to_string)
        .or_else(|| node.default_transition.clone())
        .ok_or_else(|| QuireError::invalid(format!("task {task_id} needs a transition")))?;
    let next = node
        .transitions
        .get(&transition)
        .cloned()
        .ok_or_else(|| QuireError::invalid(format!("no transition '{transition}' from {task_name}")))?;
    let next_actor = match &next {
        Some(next_name) => process
            .tasks
            .get(next_name)
            .and_then(|n| n.actor_property.as_ref())
            .and_then(|key| record.variables.get(key))
            .and_then(|value| value.as_str())
            .map(str::to_string),
        None => None,
    };

    if let Some(task) = workflow.tasks.get_mut(task_id) {
        task.state = TaskState::Completed;
        task.outcome = Some(transition.clone());
    }
    match next {
        Some(next_name) => {
            workflow.create_task(&instance_id, &next_name, next_actor, false)?;
        }
        None => {
            if let Some(record) = workflow.instances.get_mut(&instance_id) {
                record.instance.state = WorkflowInstanceState::Completed {
                    transition: Some(transition),
                };
                record.instance.end_date = Some(now);
            }
        }
    }

    let task = workflow
        .tasks
        .get(task_id)
        .and_then(|task| workflow.view(task_id, task))
        .ok_or_else(|| QuireError::internal("ended task vanished"))?;
    Ok(task)
}

#[async_trait]
impl WorkflowEffects for MockEffects {
    async fn definition_by_name(&self, name: &str) -> Result<Option<WorkflowDefinition>> {
        Ok(self
            .state
            .lock()
            .workflow
            .definitions
            .values()
            .find(|(definition, _)| definition.name == name)
            .map(|(definition, _)| definition.clone()))
    }

    async fn start_workflow(&self, definition_id: &str, properties: TaskProperties) -> Result<WorkflowPath> {
        let mut state = self.state.lock();
        let now = state.tick();
        let workflow = &mut state.workflow;
        let (definition, process) = workflow
            .definitions
            .get(definition_id)
            .cloned()
            .ok_or_else(|| QuireError::not_found(format!("definition {definition_id}")))?;

        let instance_id = format!("{}${}", process.engine(), workflow.next_id());
        let instance = WorkflowInstance {
            id: instance_id.clone(),
            definition,
            start_date: now,
            end_date: None,
            state: WorkflowInstanceState::Active,
        };
        workflow.instances.insert(
            instance_id.clone(),
            InstanceRecord {
                instance: instance.clone(),
                variables: properties,
            },
        );
        workflow.create_task(&instance_id, &process.start_task, None, true)?;

        Ok(WorkflowPath {
            id: instance_id,
            instance,
        })
    }

    async fn get_instance(&self, instance_id: &str) -> Result<Option<WorkflowInstance>> {
        Ok(self
            .state
            .lock()
            .workflow
            .instances
            .get(instance_id)
            .map(|record| record.instance.clone()))
    }

    async fn start_task(&self, instance_id: &str) -> Result<Option<WorkflowTask>> {
        let state = self.state.lock();
        let workflow = &state.workflow;
        let Some(record) = workflow.instances.get(instance_id) else {
            return Ok(None);
        };
        let process = workflow.definition_for(&record.instance)?;
        Ok(workflow
            .tasks
            .iter()
            .find(|(_, task)| task.instance_id == instance_id && task.name == process.start_task)
            .and_then(|(id, task)| workflow.view(id, task)))
    }

    async fn start_tasks(&self, instance_ids: &[String]) -> Result<Vec<WorkflowTask>> {
        let mut tasks = Vec::with_capacity(instance_ids.len());
        for id in instance_ids {
            if let Some(task) = self.start_task(id).await? {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    async fn tasks_for_path(&self, path_id: &str) -> Result<Vec<WorkflowTask>> {
        let state = self.state.lock();
        let workflow = &state.workflow;
        Ok(workflow
            .tasks
            .iter()
            .filter(|(_, task)| task.instance_id == path_id && task.state == TaskState::InProgress)
            .filter_map(|(id, task)| workflow.view(id, task))
            .collect())
    }

    async fn end_task(&self, task_id: &str, transition: Option<&str>) -> Result<WorkflowTask> {
        let mut state = self.state.lock();
        end_task(&mut state, task_id, transition)
    }

    async fn update_task(&self, task_id: &str, properties: TaskProperties) -> Result<WorkflowTask> {
        let mut state = self.state.lock();
        let workflow = &mut state.workflow;
        let task = workflow
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| QuireError::not_found(format!("task {task_id}")))?;
        task.local.extend(properties);
        let task = workflow
            .tasks
            .get(task_id)
            .and_then(|task| workflow.view(task_id, task))
            .ok_or_else(|| QuireError::internal("updated task vanished"))?;
        Ok(task)
    }

    async fn query_tasks(&self, query: &WorkflowTaskQuery) -> Result<Vec<WorkflowTask>> {
        let state = self.state.lock();
        if state.workflow.fail_queries {
            return Err(QuireError::internal("task query service unavailable"));
        }
        let workflow = &state.workflow;
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(workflow
            .tasks
            .iter()
            .filter(|(_, task)| query.task_name.as_ref().map_or(true, |name| &task.name == name))
            .filter(|(_, task)| query.state.map_or(true, |s| task.state == s))
            .filter(|(_, task)| {
                query
                    .actor
                    .as_ref()
                    .map_or(true, |actor| task.actor.as_ref() == Some(actor))
            })
            .filter(|(_, task)| {
                workflow.instances.get(&task.instance_id).map_or(false, |record| {
                    (!query.active_only || record.instance.is_active())
                        && query
                            .process_properties
                            .iter()
                            .all(|(key, value)| record.variables.get(key) == Some(value))
                })
            })
            .filter_map(|(id, task)| workflow.view(id, task))
            .take(limit)
            .collect())
    }

    async fn cancel_workflow(&self, instance_id: &str) -> Result<WorkflowInstance> {
        let mut state = self.state.lock();
        let now = state.tick();
        let workflow = &mut state.workflow;
        let record = workflow
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| QuireError::not_found(format!("workflow instance {instance_id}")))?;
        record.instance.state = WorkflowInstanceState::Cancelled;
        record.instance.end_date = Some(now);
        let instance = record.instance.clone();

        for task in workflow.tasks.values_mut() {
            if task.instance_id == instance_id && task.state == TaskState::InProgress {
                task.state = TaskState::Completed;
            }
        }
        Ok(instance)
    }
}
