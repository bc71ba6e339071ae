//! Entry voting
//!
//! Guards a records-management operation before it runs. The operation
//! declares its requirements as a list of [`EntryRequirement`]s and
//! [`CapabilityService::vote`] folds them into one [`Vote`]:
//!
//! - the system user is always granted
//! - no requirement at all abstains
//! - an explicit `Deny`, `Abstain`, `Allow` or `Query` decides on its own,
//!   whichever comes first
//! - every check must come out `Allowed`; anything else denies, including an
//!   unknown capability or a missing node
//!
//! Results of `Query` operations are left to
//! [`CapabilityService::filter_readable`].

use crate::error::CapabilityResult;
use crate::service::{CapabilityService, VIEW_RECORDS};
use quire_core::effects::{CapabilityEffects, NodeProperties};
use quire_core::{AccessStatus, NodeRef};
use serde::{Deserialize, Serialize};

/// Composite consulted for deletes
pub const DELETE: &str = "Delete";

/// Outcome of an entry vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    /// The operation may run
    Granted,
    /// The operation must not run
    Denied,
    /// No records-management opinion
    Abstain,
}

/// One requirement an operation places on the caller
#[derive(Debug, Clone, PartialEq)]
pub enum EntryRequirement {
    /// Always allowed
    Allow,
    /// Always denied
    Deny,
    /// No opinion
    Abstain,
    /// Allowed on entry; the results get filtered
    Query,
    /// A named capability must be allowed on the node
    Capability {
        /// Capability name
        name: String,
        /// Node the capability is checked on
        node: Option<NodeRef>,
    },
    /// The node must be readable
    Read {
        /// Node read
        node: NodeRef,
    },
    /// The node may be updated with the given aspect and properties
    Update {
        /// Node updated
        node: NodeRef,
        /// Aspect added or removed
        aspect: Option<String>,
        /// New property values
        properties: Option<NodeProperties>,
    },
    /// The node's properties may be set
    UpdateProperties {
        /// Node updated
        node: NodeRef,
        /// New property values
        properties: NodeProperties,
    },
    /// The node may be deleted
    Delete {
        /// Node deleted
        node: Option<NodeRef>,
    },
}

impl EntryRequirement {
    /// Require a capability on a node
    pub fn capability(name: impl Into<String>, node: NodeRef) -> Self {
        Self::Capability {
            name: name.into(),
            node: Some(node),
        }
    }

    fn verdict(&self) -> Option<Vote> {
        match self {
            Self::Deny => Some(Vote::Denied),
            Self::Abstain => Some(Vote::Abstain),
            Self::Allow | Self::Query => Some(Vote::Granted),
            _ => None,
        }
    }
}

impl<E: CapabilityEffects> CapabilityService<E> {
    /// Vote on an operation for the current user
    pub async fn vote(&self, requirements: &[EntryRequirement]) -> CapabilityResult<Vote> {
        let user = self.effects.current_user().await?;
        if user.is_system() {
            return Ok(Vote::Granted);
        }
        if requirements.is_empty() {
            return Ok(Vote::Abstain);
        }

        for requirement in requirements {
            if let Some(vote) = requirement.verdict() {
                return Ok(vote);
            }
            let status = self.check(requirement).await?;
            if status != AccessStatus::Allowed {
                tracing::debug!(user = %user, ?requirement, ?status, "entry vote denied");
                return Ok(Vote::Denied);
            }
        }
        Ok(Vote::Granted)
    }

    async fn check(&self, requirement: &EntryRequirement) -> CapabilityResult<AccessStatus> {
        match requirement {
            EntryRequirement::Capability {
                name,
                node: Some(node),
            } => match self.get_capability(name) {
                Some(_) => self.has_permission(node, name).await,
                None => Ok(AccessStatus::Denied),
            },
            EntryRequirement::Read { node } => self.has_permission(node, VIEW_RECORDS).await,
            EntryRequirement::Update {
                node,
                aspect,
                properties,
            } => {
                self.evaluate_update(node, aspect.as_deref(), properties.as_ref())
                    .await
            }
            EntryRequirement::UpdateProperties { node, properties } => {
                self.evaluate_update_properties(node, properties).await
            }
            EntryRequirement::Delete { node: Some(node) } => self.has_permission(node, DELETE).await,
            _ => Ok(AccessStatus::Denied),
        }
    }
}
