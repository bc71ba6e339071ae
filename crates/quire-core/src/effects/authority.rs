//! Authority effects

use crate::{Result, UserName};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Prefix carried by every group authority name
pub const GROUP_PREFIX: &str = "GROUP_";

/// Effect trait for group and zone management
#[async_trait]
pub trait AuthorityEffects: Send + Sync {
    /// Full authority names of the groups in a zone
    async fn authorities_in_zone(&self, zone: &str) -> Result<BTreeSet<String>>;

    /// Whether an authority exists
    async fn authority_exists(&self, name: &str) -> Result<bool>;

    /// Create a group in the given zones, returning its full authority name
    async fn create_group(
        &self,
        short_name: &str,
        display_name: &str,
        zones: &[String],
    ) -> Result<String>;

    /// Delete a group
    async fn delete_group(&self, name: &str) -> Result<()>;

    /// Display name of a group
    async fn display_name(&self, name: &str) -> Result<Option<String>>;

    /// Change the display name of a group
    async fn set_display_name(&self, name: &str, display_name: &str) -> Result<()>;

    /// Add a user or group to a group
    async fn add_authority(&self, parent: &str, child: &str) -> Result<()>;

    /// Remove a user or group from a group
    async fn remove_authority(&self, parent: &str, child: &str) -> Result<()>;

    /// Users contained in a group, transitively
    async fn contained_users(&self, group: &str) -> Result<BTreeSet<UserName>>;

    /// Groups contained in a group, transitively
    async fn contained_groups(&self, group: &str) -> Result<BTreeSet<String>>;

    /// Groups containing an authority, transitively
    async fn containing_groups(&self, authority: &str) -> Result<BTreeSet<String>>;
}
