//! Capability conditions
//!
//! A condition is a named boolean predicate over an [`EvaluationContext`].
//! Declarative capabilities require each of their conditions to produce a
//! configured outcome. Conditions are registered once into a
//! [`ConditionTable`] and resolved by name when the registry is built, so an
//! unknown name is a load-time error.

use crate::context::EvaluationContext;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Named predicate over a node
pub trait CapabilityCondition: Send + Sync {
    /// Name referenced from configuration
    fn name(&self) -> &str;

    /// Evaluate the predicate
    fn evaluate(&self, context: &EvaluationContext) -> bool;
}

impl fmt::Debug for dyn CapabilityCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityCondition")
            .field(&self.name())
            .finish()
    }
}

/// Condition backed by a plain function
#[derive(Clone, Copy)]
pub struct FnCondition {
    name: &'static str,
    predicate: fn(&EvaluationContext) -> bool,
}

impl FnCondition {
    /// Create a condition from a name and predicate
    pub const fn new(name: &'static str, predicate: fn(&EvaluationContext) -> bool) -> Self {
        Self { name, predicate }
    }
}

impl CapabilityCondition for FnCondition {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, context: &EvaluationContext) -> bool {
        (self.predicate)(context)
    }
}

/// Built-in condition names
pub mod names {
    pub const FILLING: &str = "filling";
    pub const FROZEN: &str = "frozen";
    pub const CLOSED: &str = "closed";
    pub const DECLARED: &str = "declared";
    pub const CUTOFF: &str = "cutoff";
    pub const VITAL_RECORD: &str = "vitalRecord";
    pub const SCHEDULED: &str = "scheduled";
    pub const ELIGIBLE_FOR_CUTOFF: &str = "eligibleForCutoff";
    pub const ELIGIBLE_FOR_DESTRUCTION: &str = "eligibleForDestruction";
    pub const TRANSFERRING: &str = "transferring";
}

const BUILTIN_CONDITIONS: [FnCondition; 10] = [
    FnCondition::new(names::FILLING, |ctx| ctx.filing),
    FnCondition::new(names::FROZEN, |ctx| ctx.state.frozen),
    FnCondition::new(names::CLOSED, |ctx| ctx.state.closed),
    FnCondition::new(names::DECLARED, |ctx| ctx.state.declared),
    FnCondition::new(names::CUTOFF, |ctx| ctx.state.cut_off),
    FnCondition::new(names::VITAL_RECORD, |ctx| ctx.state.vital_record),
    FnCondition::new(names::SCHEDULED, |ctx| ctx.state.scheduled),
    // an undeclared record is never due for cut off
    FnCondition::new(names::ELIGIBLE_FOR_CUTOFF, |ctx| {
        ctx.state.eligible_for_cutoff && (!ctx.state.is_record() || ctx.state.declared)
    }),
    FnCondition::new(names::ELIGIBLE_FOR_DESTRUCTION, |ctx| {
        ctx.state.eligible_for_destruction
    }),
    FnCondition::new(names::TRANSFERRING, |ctx| ctx.state.transferring),
];

/// Immutable name to condition table
#[derive(Clone, Default)]
pub struct ConditionTable {
    conditions: BTreeMap<String, Arc<dyn CapabilityCondition>>,
}

impl ConditionTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the built-in records-management conditions
    pub fn builtin() -> Self {
        BUILTIN_CONDITIONS
            .into_iter()
            .fold(Self::new(), |table, condition| table.with(condition))
    }

    /// Add or replace a condition
    pub fn with(mut self, condition: impl CapabilityCondition + 'static) -> Self {
        self.conditions
            .insert(condition.name().to_string(), Arc::new(condition));
        self
    }

    /// Resolve a condition by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn CapabilityCondition>> {
        self.conditions.get(name).cloned()
    }

    /// Registered condition names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    /// Number of registered conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl fmt::Debug for ConditionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.conditions.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::{FilePlanComponentKind, NodeRef, NodeState};

    fn record_context(state: NodeState) -> EvaluationContext {
        EvaluationContext::system(NodeRef::workspace("rec"), state)
    }

    #[test]
    fn test_builtin_table_has_every_condition() {
        let table = ConditionTable::builtin();
        assert_eq!(table.len(), 10);
        assert!(table.get(names::ELIGIBLE_FOR_CUTOFF).is_some());
        assert!(table.get("isFrozen").is_none());
    }

    #[test]
    fn test_eligible_for_cutoff_requires_declared_record() {
        let table = ConditionTable::builtin();
        let condition = table.get(names::ELIGIBLE_FOR_CUTOFF).unwrap();

        let mut state =
            NodeState::in_file_plan(FilePlanComponentKind::Record, NodeRef::workspace("fp"));
        state.eligible_for_cutoff = true;
        assert!(!condition.evaluate(&record_context(state.clone())));

        state.declared = true;
        assert!(condition.evaluate(&record_context(state)));

        let mut folder = NodeState::in_file_plan(
            FilePlanComponentKind::RecordFolder,
            NodeRef::workspace("fp"),
        );
        folder.eligible_for_cutoff = true;
        assert!(condition.evaluate(&record_context(folder)));
    }

    #[test]
    fn test_custom_condition_replaces_builtin() {
        let table = ConditionTable::builtin().with(FnCondition::new(names::FROZEN, |_| true));
        let frozen = table.get(names::FROZEN).unwrap();
        assert!(frozen.evaluate(&record_context(NodeState::default())));
        assert_eq!(table.len(), 10);
    }
}
