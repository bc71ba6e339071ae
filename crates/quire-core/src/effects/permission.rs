//! Permission effects

use crate::{AccessStatus, NodeRef, Result, UserName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Permission that grants filing into a node
pub const FILING_PERMISSION: &str = "Filing";

/// An ACL entry set directly on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPermission {
    /// Authority the entry applies to (user or `GROUP_` name)
    pub authority: String,
    /// Permission name
    pub permission: String,
    /// Allow (`true`) or deny (`false`)
    pub allowed: bool,
}

/// Effect trait for ACL operations
#[async_trait]
pub trait PermissionEffects: Send + Sync {
    /// Evaluate a named permission for a user on a node
    ///
    /// Entries are inherited from ancestors. `Undetermined` when no entry
    /// applies to the user or any group containing them.
    async fn has_permission(
        &self,
        node: &NodeRef,
        user: &UserName,
        permission: &str,
    ) -> Result<AccessStatus>;

    /// Set an ACL entry on a node, replacing any entry for the same pair
    async fn set_permission(
        &self,
        node: &NodeRef,
        authority: &str,
        permission: &str,
        allow: bool,
    ) -> Result<()>;

    /// Remove an ACL entry from a node
    async fn delete_permission(&self, node: &NodeRef, authority: &str, permission: &str)
        -> Result<()>;

    /// Entries set directly on a node (not inherited ones)
    async fn all_set_permissions(&self, node: &NodeRef) -> Result<Vec<AccessPermission>>;
}
