//! Capabilities
//!
//! A [`Capability`] is either declarative (kinds, conditions, role grant,
//! optionally deferring to an underlying permission) or composite (the OR of its
//! members). Declarative gating is a pure function of an
//! [`EvaluationContext`]; only the permission-model fallback and composite
//! recursion need the service.

use crate::condition::CapabilityCondition;
use crate::context::EvaluationContext;
use quire_core::{AccessStatus, FilePlanComponentKind};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A named authorization unit
///
/// Identity is the name: equality and hashing ignore the definition.
#[derive(Debug, Clone)]
pub struct Capability {
    name: String,
    group: Option<String>,
    private: bool,
    actions: BTreeSet<String>,
    definition: CapabilityDefinition,
}

/// How a capability decides
#[derive(Debug, Clone)]
pub enum CapabilityDefinition {
    /// Kinds, conditions and role grant
    Declarative(DeclarativeCapability),
    /// Existential OR of member capabilities
    Composite(Vec<Arc<Capability>>),
}

/// Declarative capability rules
#[derive(Debug, Clone)]
pub struct DeclarativeCapability {
    /// Applicable kinds, `None` for every kind
    pub kinds: Option<Vec<FilePlanComponentKind>>,
    /// Conditions with the outcome each must produce
    pub conditions: Vec<(Arc<dyn CapabilityCondition>, bool)>,
    /// Underlying permission whose answer is final once the gates pass
    pub permission: Option<String>,
    /// Whether a held role must grant the capability
    pub requires_grant: bool,
}

/// Outcome of the pure part of declarative evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate<'a> {
    /// Refused by role, kind, condition or grant
    Denied,
    /// Granted outright
    Granted,
    /// Passed the gates; ask the permission model for this permission
    Delegate(&'a str),
}

impl DeclarativeCapability {
    /// Apply role, kind, condition and grant gates in order
    ///
    /// Capabilities backed by a permission outside the role model may skip
    /// the grant gate; the permission model then decides for every role.
    pub fn gate(&self, name: &str, context: &EvaluationContext) -> Gate<'_> {
        let system = context.is_system();

        if !system && !context.has_any_role() {
            return Gate::Denied;
        }

        if let Some(kinds) = &self.kinds {
            match context.state.kind {
                Some(kind) if kinds.contains(&kind) => {}
                _ => return Gate::Denied,
            }
        }

        let conditions_hold = self
            .conditions
            .iter()
            .all(|(condition, expected)| condition.evaluate(context) == *expected);
        if !conditions_hold {
            return Gate::Denied;
        }

        if self.requires_grant && !system && !context.is_granted(name) {
            return Gate::Denied;
        }

        match &self.permission {
            Some(permission) => Gate::Delegate(permission),
            None => Gate::Granted,
        }
    }
}

/// Combine member results of a composite capability
///
/// `Allowed` if any member is allowed; otherwise `Undetermined` if any member
/// is undetermined; otherwise `Denied`. An empty composite is `Denied`.
pub fn combine_composite(results: impl IntoIterator<Item = AccessStatus>) -> AccessStatus {
    let mut undetermined = false;
    for status in results {
        match status {
            AccessStatus::Allowed => return AccessStatus::Allowed,
            AccessStatus::Undetermined => undetermined = true,
            AccessStatus::Denied => {}
        }
    }
    if undetermined {
        AccessStatus::Undetermined
    } else {
        AccessStatus::Denied
    }
}

impl Capability {
    /// Create a capability
    pub fn new(
        name: impl Into<String>,
        group: Option<String>,
        private: bool,
        actions: impl IntoIterator<Item = String>,
        definition: CapabilityDefinition,
    ) -> Self {
        Self {
            name: name.into(),
            group,
            private,
            actions: actions.into_iter().collect(),
            definition,
        }
    }

    /// Unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// UI grouping
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Hidden from public enumeration
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Actions triggerable through this capability
    pub fn action_names(&self) -> &BTreeSet<String> {
        &self.actions
    }

    /// How the capability decides
    pub fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    /// Whether this is a composite capability
    pub fn is_composite(&self) -> bool {
        matches!(self.definition, CapabilityDefinition::Composite(_))
    }

    /// Applicable kinds; `None` for every kind and for composites
    pub fn kinds(&self) -> Option<&[FilePlanComponentKind]> {
        match &self.definition {
            CapabilityDefinition::Declarative(declarative) => declarative.kinds.as_deref(),
            CapabilityDefinition::Composite(_) => None,
        }
    }

    /// Condition names with their required outcomes
    pub fn conditions(&self) -> Vec<(&str, bool)> {
        match &self.definition {
            CapabilityDefinition::Declarative(declarative) => declarative
                .conditions
                .iter()
                .map(|(condition, expected)| (condition.name(), *expected))
                .collect(),
            CapabilityDefinition::Composite(_) => Vec::new(),
        }
    }

    /// Direct member capabilities of a composite
    pub fn members(&self) -> &[Arc<Capability>] {
        match &self.definition {
            CapabilityDefinition::Composite(members) => members,
            CapabilityDefinition::Declarative(_) => &[],
        }
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
