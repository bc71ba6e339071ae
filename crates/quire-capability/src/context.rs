//! Evaluation context
//!
//! Everything a capability needs to decide, gathered once per node and user
//! before any capability is evaluated. Evaluation against a context is pure.

use quire_core::{NodeRef, NodeState, UserName};
use std::collections::BTreeSet;

/// Snapshot of the facts a capability evaluation reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    /// Node under evaluation
    pub node: NodeRef,
    /// Records-management state of the node
    pub state: NodeState,
    /// Acting user
    pub user: UserName,
    /// Names of the roles the user holds on the owning file plan
    pub roles: BTreeSet<String>,
    /// Union of the capability grants of those roles
    pub granted: BTreeSet<String>,
    /// Whether the user may file into the node
    pub filing: bool,
}

impl EvaluationContext {
    /// Context for the system user, which files everywhere and holds no roles
    pub fn system(node: NodeRef, state: NodeState) -> Self {
        Self {
            node,
            state,
            user: UserName::system(),
            roles: BTreeSet::new(),
            granted: BTreeSet::new(),
            filing: true,
        }
    }

    /// Whether the acting user is the system user
    pub fn is_system(&self) -> bool {
        self.user.is_system()
    }

    /// Whether the user holds at least one role on the file plan
    pub fn has_any_role(&self) -> bool {
        !self.roles.is_empty()
    }

    /// Whether one of the user's roles grants the named capability
    pub fn is_granted(&self, capability: &str) -> bool {
        self.granted.contains(capability)
    }
}
