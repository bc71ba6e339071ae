//! Capability engine error types

use quire_core::QuireError;
use thiserror::Error;

/// Errors from capability configuration, lookup and role management.
///
/// Evaluation itself never fails for a "no access" outcome; these errors
/// report programming or configuration mistakes and effect failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// No capability is registered under the name.
    #[error("unknown capability '{0}'")]
    UnknownCapability(String),

    /// A capability references a condition that is not registered.
    #[error("capability '{capability}' references unknown condition '{condition}'")]
    UnknownCondition {
        /// Capability declaring the condition
        capability: String,
        /// Unregistered condition name
        condition: String,
    },

    /// No role with this name exists on the file plan.
    #[error("role '{role}' does not exist on file plan {file_plan}")]
    UnknownRole {
        /// Role name
        role: String,
        /// File plan id
        file_plan: String,
    },

    /// A role with this name already exists on the file plan.
    #[error("role '{role}' already exists on file plan {file_plan}")]
    RoleExists {
        /// Role name
        role: String,
        /// File plan id
        file_plan: String,
    },

    /// Composite capabilities reference each other in a cycle.
    #[error("composite capability cycle: {}", path.join(" -> "))]
    CompositeCycle {
        /// Names along the cycle, first name repeated at the end
        path: Vec<String>,
    },

    /// The caller may not see the node.
    #[error("access denied to node {node}")]
    AccessDenied {
        /// Node that was refused
        node: String,
    },

    /// Configuration failed validation.
    #[error("invalid capability configuration: {message}")]
    InvalidConfig {
        /// Validation message
        message: String,
    },

    /// Effect handler failure.
    #[error(transparent)]
    Core(#[from] QuireError),
}

impl CapabilityError {
    /// Create an unknown role error.
    pub fn unknown_role(role: impl Into<String>, file_plan: impl Into<String>) -> Self {
        Self::UnknownRole {
            role: role.into(),
            file_plan: file_plan.into(),
        }
    }

    /// Create a role exists error.
    pub fn role_exists(role: impl Into<String>, file_plan: impl Into<String>) -> Self {
        Self::RoleExists {
            role: role.into(),
            file_plan: file_plan.into(),
        }
    }

    /// Create an access denied error.
    pub fn access_denied(node: impl Into<String>) -> Self {
        Self::AccessDenied { node: node.into() }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for capability operations.
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;
