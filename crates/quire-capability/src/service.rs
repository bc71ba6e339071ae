//! Capability Service
//!
//! Entry point for capability checks.
//!
//! # Architecture
//!
//! 1. `evaluation_context` gathers node state, roles and filing rights asynchronously
//! 2. Declarative gates run synchronously against that snapshot
//! 3. Only permission-backed capabilities and composite members go back to effects
//!
//! One context serves every capability in a batch query, so a batch costs a
//! single round of role and state lookups.
//!
//! The update checks consult the protected model first: changing a protected
//! aspect or property is denied unless one of its owning actions is
//! executable. Read filtering keeps nodes outside any file plan as they are.

use crate::capability::{combine_composite, Capability, CapabilityDefinition, Gate};
use crate::condition::ConditionTable;
use crate::config::CapabilityConfig;
use crate::context::EvaluationContext;
use crate::error::{CapabilityError, CapabilityResult};
use crate::registry::CapabilityRegistry;
use crate::role::FilePlanRoleService;
use futures::future::BoxFuture;
use quire_core::effects::{CapabilityEffects, NodeProperties, FILING_PERMISSION};
use quire_core::{AccessStatus, NodeRef};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Capability consulted by read checks
pub const VIEW_RECORDS: &str = "ViewRecords";
/// Composite consulted for node updates
pub const UPDATE: &str = "Update";
/// Composite consulted for property updates
pub const UPDATE_PROPERTIES: &str = "UpdateProperties";

/// Capability evaluation over a registry and effect handlers
pub struct CapabilityService<E> {
    pub(crate) effects: Arc<E>,
    registry: Arc<CapabilityRegistry>,
    roles: FilePlanRoleService<E>,
}

impl<E: CapabilityEffects> CapabilityService<E> {
    /// Build a service from configuration with the built-in conditions
    pub fn from_config(effects: Arc<E>, config: &CapabilityConfig) -> CapabilityResult<Self> {
        let registry = Arc::new(CapabilityRegistry::from_config(
            config,
            &ConditionTable::builtin(),
        )?);
        let roles = FilePlanRoleService::new(
            Arc::clone(&effects),
            Arc::clone(&registry),
            config.roles.clone(),
        );
        Ok(Self::new(effects, registry, roles))
    }

    /// Service over the reference capability model
    pub fn reference(effects: Arc<E>) -> CapabilityResult<Self> {
        Self::from_config(effects, &CapabilityConfig::reference()?)
    }

    /// Create a service from prepared parts
    pub fn new(effects: Arc<E>, registry: Arc<CapabilityRegistry>, roles: FilePlanRoleService<E>) -> Self {
        Self {
            effects,
            registry,
            roles,
        }
    }

    /// The capability registry
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// The file plan role service
    pub fn roles(&self) -> &FilePlanRoleService<E> {
        &self.roles
    }

    /// Look up a capability
    pub fn get_capability(&self, name: &str) -> Option<Arc<Capability>> {
        self.registry.get(name)
    }

    /// Registered capabilities, optionally including private ones
    pub fn get_capabilities(&self, include_private: bool) -> Vec<Arc<Capability>> {
        if include_private {
            self.registry.all()
        } else {
            self.registry.capabilities()
        }
    }

    /// Evaluate a named capability for the current user on a node
    pub async fn has_permission(&self, node: &NodeRef, name: &str) -> CapabilityResult<AccessStatus> {
        let capability = self
            .registry
            .get(name)
            .ok_or_else(|| CapabilityError::UnknownCapability(name.to_string()))?;
        let context = self.evaluation_context(node).await?;
        self.evaluate(&capability, &context).await
    }

    /// Evaluate every public capability for the current user on a node
    pub async fn get_capabilities_access_state(
        &self,
        node: &NodeRef,
    ) -> CapabilityResult<HashMap<Arc<Capability>, AccessStatus>> {
        let capabilities = self.registry.capabilities();
        self.access_state(node, capabilities).await
    }

    /// Evaluate the named capabilities for the current user on a node
    pub async fn get_capabilities_access_state_for(
        &self,
        node: &NodeRef,
        names: &[&str],
    ) -> CapabilityResult<HashMap<Arc<Capability>, AccessStatus>> {
        let capabilities = names
            .iter()
            .map(|name| {
                self.registry
                    .get(name)
                    .ok_or_else(|| CapabilityError::UnknownCapability(name.to_string()))
            })
            .collect::<CapabilityResult<Vec<_>>>()?;
        self.access_state(node, capabilities).await
    }

    async fn access_state(
        &self,
        node: &NodeRef,
        capabilities: Vec<Arc<Capability>>,
    ) -> CapabilityResult<HashMap<Arc<Capability>, AccessStatus>> {
        let context = self.evaluation_context(node).await?;
        let mut states = HashMap::with_capacity(capabilities.len());
        for capability in capabilities {
            let status = self.evaluate(&capability, &context).await?;
            states.insert(capability, status);
        }
        tracing::debug!(node = %node, user = %context.user, evaluated = states.len(), "capability access state");
        Ok(states)
    }

    /// Whether the current user may not add or remove an aspect on a node
    pub async fn is_protected_aspect(&self, node: &NodeRef, aspect: &str) -> CapabilityResult<bool> {
        let context = self.evaluation_context(node).await?;
        self.owned_elsewhere(self.registry.protection().aspect_actions(aspect), &context)
            .await
    }

    /// Whether the current user may not change a property on a node
    pub async fn is_protected_property(&self, node: &NodeRef, property: &str) -> CapabilityResult<bool> {
        let context = self.evaluation_context(node).await?;
        self.owned_elsewhere(self.registry.protection().property_actions(property), &context)
            .await
    }

    /// Whether applying the values would change a protected property
    ///
    /// Values equal to the stored ones are not a change.
    pub async fn includes_protected_property_change(
        &self,
        node: &NodeRef,
        properties: &NodeProperties,
    ) -> CapabilityResult<bool> {
        let context = self.evaluation_context(node).await?;
        self.protected_change(properties, &context).await
    }

    /// Evaluate an update that may add an aspect and set properties
    pub async fn evaluate_update(
        &self,
        node: &NodeRef,
        aspect: Option<&str>,
        properties: Option<&NodeProperties>,
    ) -> CapabilityResult<AccessStatus> {
        let context = self.evaluation_context(node).await?;
        if let Some(aspect) = aspect {
            let owners = self.registry.protection().aspect_actions(aspect);
            if self.owned_elsewhere(owners, &context).await? {
                tracing::debug!(node = %node, aspect, "update touches a protected aspect");
                return Ok(AccessStatus::Denied);
            }
        }
        if let Some(properties) = properties {
            if self.protected_change(properties, &context).await? {
                return Ok(AccessStatus::Denied);
            }
        }
        self.evaluate_named(UPDATE, &context).await
    }

    /// Evaluate setting properties on a node
    pub async fn evaluate_update_properties(
        &self,
        node: &NodeRef,
        properties: &NodeProperties,
    ) -> CapabilityResult<AccessStatus> {
        let context = self.evaluation_context(node).await?;
        if self.protected_change(properties, &context).await? {
            return Ok(AccessStatus::Denied);
        }
        self.evaluate_named(UPDATE_PROPERTIES, &context).await
    }

    /// Keep the nodes the current user may view
    ///
    /// Nodes outside any file plan are never filtered. Order is preserved.
    pub async fn filter_readable(&self, nodes: Vec<NodeRef>) -> CapabilityResult<Vec<NodeRef>> {
        let requested = nodes.len();
        let mut readable = Vec::with_capacity(requested);
        for node in nodes {
            if self.effects.node_state(&node).await?.kind.is_none()
                || self.has_permission(&node, VIEW_RECORDS).await?.is_allowed()
            {
                readable.push(node);
            }
        }
        tracing::debug!(requested, readable = readable.len(), "filtered readable nodes");
        Ok(readable)
    }

    /// Fail with `AccessDenied` when the current user may not view a node
    pub async fn require_readable(&self, node: &NodeRef) -> CapabilityResult<()> {
        if self.effects.node_state(node).await?.kind.is_none() {
            return Ok(());
        }
        match self.has_permission(node, VIEW_RECORDS).await? {
            AccessStatus::Denied => Err(CapabilityError::access_denied(node.to_string())),
            _ => Ok(()),
        }
    }

    async fn evaluate_named(&self, name: &str, context: &EvaluationContext) -> CapabilityResult<AccessStatus> {
        let capability = self
            .registry
            .get(name)
            .ok_or_else(|| CapabilityError::UnknownCapability(name.to_string()))?;
        self.evaluate(&capability, context).await
    }

    /// True for a protected name none of whose owning actions is executable
    async fn owned_elsewhere(
        &self,
        owners: Option<&[String]>,
        context: &EvaluationContext,
    ) -> CapabilityResult<bool> {
        let Some(actions) = owners else {
            return Ok(false);
        };
        for action in actions {
            for capability in self.registry.by_action(action) {
                if self.evaluate(&capability, context).await?.is_allowed() {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    async fn protected_change(
        &self,
        properties: &NodeProperties,
        context: &EvaluationContext,
    ) -> CapabilityResult<bool> {
        let protection = self.registry.protection();
        let owned: Vec<_> = properties
            .iter()
            .filter_map(|(name, value)| {
                protection
                    .property_actions(name)
                    .map(|owners| (name, value, owners))
            })
            .collect();
        if owned.is_empty() {
            return Ok(false);
        }

        // an absent property equals null
        let stored = self.effects.node_properties(&context.node).await?;
        for (name, value, owners) in owned {
            let unchanged = stored
                .get(name)
                .map_or(value.is_null(), |current| current == value);
            if !unchanged && self.owned_elsewhere(Some(owners), context).await? {
                tracing::debug!(node = %context.node, property = %name, "change to a protected property");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Gather the facts evaluation reads for the current user on a node
    pub async fn evaluation_context(&self, node: &NodeRef) -> CapabilityResult<EvaluationContext> {
        let state = self.effects.node_state(node).await?;
        let user = self.effects.current_user().await?;
        if user.is_system() {
            return Ok(EvaluationContext::system(node.clone(), state));
        }

        let mut roles = BTreeSet::new();
        let mut granted = BTreeSet::new();
        if let Some(file_plan) = &state.file_plan {
            for role in self.roles.get_roles_by_user(file_plan, &user, true).await? {
                granted.extend(role.capabilities);
                roles.insert(role.name);
            }
        }
        let filing = self
            .effects
            .has_permission(node, &user, FILING_PERMISSION)
            .await?
            .is_allowed();

        Ok(EvaluationContext {
            node: node.clone(),
            state,
            user,
            roles,
            granted,
            filing,
        })
    }

    /// Evaluate a capability against a prepared context
    pub fn evaluate<'a>(
        &'a self,
        capability: &'a Capability,
        context: &'a EvaluationContext,
    ) -> BoxFuture<'a, CapabilityResult<AccessStatus>> {
        Box::pin(async move {
            match capability.definition() {
                CapabilityDefinition::Declarative(declarative) => {
                    match declarative.gate(capability.name(), context) {
                        Gate::Denied => Ok(AccessStatus::Denied),
                        Gate::Granted => Ok(AccessStatus::Allowed),
                        Gate::Delegate(permission) => Ok(self
                            .effects
                            .has_permission(&context.node, &context.user, permission)
                            .await?),
                    }
                }
                CapabilityDefinition::Composite(members) => {
                    let mut results = Vec::with_capacity(members.len());
                    for member in members {
                        let status = self.evaluate(member, context).await?;
                        if status.is_allowed() {
                            return Ok(status);
                        }
                        results.push(status);
                    }
                    Ok(combine_composite(results))
                }
            }
        })
    }
}
