//! File plan roles
//!
//! A role is an authority group living in the file plan's role zone. Its
//! capability grants are the capability permissions set on the file plan root
//! for that group; nothing else is stored.

use crate::config::RoleEntry;
use crate::error::{CapabilityError, CapabilityResult};
use crate::registry::CapabilityRegistry;
use quire_core::effects::{AuthorityEffects, PermissionEffects, FILING_PERMISSION, GROUP_PREFIX};
use quire_core::{NodeRef, UserName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Name of the administrator role
pub const ADMINISTRATOR_ROLE: &str = "Administrator";

const ROLE_ZONE_PREFIX: &str = "rmRoleZone";

/// A records-management role on one file plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name, unique per file plan
    pub name: String,
    /// Human-readable label
    pub display_label: String,
    /// Granted public capability names
    pub capabilities: BTreeSet<String>,
    /// Full authority name of the backing group
    pub role_group_name: String,
}

/// Zone holding the role groups of a file plan
pub fn role_zone(file_plan: &NodeRef) -> String {
    format!("{ROLE_ZONE_PREFIX}{}", file_plan.id())
}

/// Full authority name of a role group
pub fn role_authority(file_plan: &NodeRef, role: &str) -> String {
    format!("{GROUP_PREFIX}{role}{}", file_plan.id())
}

/// Role management over authority and permission effects
pub struct FilePlanRoleService<E> {
    effects: Arc<E>,
    registry: Arc<CapabilityRegistry>,
    bootstrap: Vec<RoleEntry>,
}

impl<E> Clone for FilePlanRoleService<E> {
    fn clone(&self) -> Self {
        Self {
            effects: Arc::clone(&self.effects),
            registry: Arc::clone(&self.registry),
            bootstrap: self.bootstrap.clone(),
        }
    }
}

impl<E: AuthorityEffects + PermissionEffects> FilePlanRoleService<E> {
    /// Create a role service with the given bootstrap roles
    pub fn new(effects: Arc<E>, registry: Arc<CapabilityRegistry>, bootstrap: Vec<RoleEntry>) -> Self {
        Self {
            effects,
            registry,
            bootstrap,
        }
    }

    fn is_system_role(&self, name: &str) -> bool {
        self.bootstrap.iter().any(|role| role.system && role.name == name)
    }

    /// Create every bootstrap role missing from the file plan
    pub async fn bootstrap_default_roles(&self, file_plan: &NodeRef) -> CapabilityResult<()> {
        for entry in &self.bootstrap {
            if self.exists_role(file_plan, &entry.name).await? {
                continue;
            }
            let capabilities = if entry.all_capabilities {
                self.registry
                    .capabilities()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            } else {
                entry.capabilities.clone()
            };
            let role = self
                .create_role(file_plan, &entry.name, &entry.display_label, &capabilities)
                .await?;
            if entry.filing {
                self.effects
                    .set_permission(file_plan, &role.role_group_name, FILING_PERMISSION, true)
                    .await?;
            }
        }
        tracing::info!(file_plan = %file_plan, roles = self.bootstrap.len(), "bootstrapped file plan roles");
        Ok(())
    }

    /// Roles defined on the file plan
    pub async fn get_roles(&self, file_plan: &NodeRef, include_system: bool) -> CapabilityResult<Vec<Role>> {
        let authorities = self.effects.authorities_in_zone(&role_zone(file_plan)).await?;
        self.roles_for_authorities(file_plan, authorities, include_system)
            .await
    }

    /// Roles on the file plan held by the user
    pub async fn get_roles_by_user(
        &self,
        file_plan: &NodeRef,
        user: &UserName,
        include_system: bool,
    ) -> CapabilityResult<Vec<Role>> {
        let zone_groups = self.effects.authorities_in_zone(&role_zone(file_plan)).await?;
        let containing = self.effects.containing_groups(user.as_str()).await?;
        let held = zone_groups.intersection(&containing).cloned().collect();
        self.roles_for_authorities(file_plan, held, include_system)
            .await
    }

    async fn roles_for_authorities(
        &self,
        file_plan: &NodeRef,
        authorities: BTreeSet<String>,
        include_system: bool,
    ) -> CapabilityResult<Vec<Role>> {
        if authorities.is_empty() {
            return Ok(Vec::new());
        }

        let mut grants: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for permission in self.effects.all_set_permissions(file_plan).await? {
            let public = self
                .registry
                .get(&permission.permission)
                .map_or(false, |c| !c.is_private());
            if permission.allowed && public && authorities.contains(&permission.authority) {
                grants
                    .entry(permission.authority)
                    .or_default()
                    .insert(permission.permission);
            }
        }

        let mut roles = Vec::with_capacity(authorities.len());
        for authority in authorities {
            let name = authority
                .strip_prefix(GROUP_PREFIX)
                .and_then(|short| short.strip_suffix(file_plan.id()))
                .unwrap_or(authority.as_str())
                .to_string();
            if !include_system && self.is_system_role(&name) {
                continue;
            }
            let display_label = self
                .effects
                .display_name(&authority)
                .await?
                .unwrap_or_else(|| name.clone());
            roles.push(Role {
                capabilities: grants.remove(&authority).unwrap_or_default(),
                name,
                display_label,
                role_group_name: authority,
            });
        }
        Ok(roles)
    }

    /// Look up a role by name
    pub async fn get_role(&self, file_plan: &NodeRef, name: &str) -> CapabilityResult<Option<Role>> {
        Ok(self
            .get_roles(file_plan, true)
            .await?
            .into_iter()
            .find(|role| role.name == name))
    }

    /// Whether a role exists on the file plan
    pub async fn exists_role(&self, file_plan: &NodeRef, name: &str) -> CapabilityResult<bool> {
        let authority = role_authority(file_plan, name);
        Ok(self
            .effects
            .authorities_in_zone(&role_zone(file_plan))
            .await?
            .contains(&authority))
    }

    /// Create a role with the given capability grants
    pub async fn create_role(
        &self,
        file_plan: &NodeRef,
        name: &str,
        display_label: &str,
        capabilities: &BTreeSet<String>,
    ) -> CapabilityResult<Role> {
        if self.exists_role(file_plan, name).await? {
            return Err(CapabilityError::role_exists(name, file_plan.id()));
        }
        self.check_capabilities(capabilities)?;

        let short_name = format!("{name}{}", file_plan.id());
        let authority = self
            .effects
            .create_group(&short_name, display_label, &[role_zone(file_plan)])
            .await?;
        self.grant_all(file_plan, &authority, capabilities).await?;

        tracing::info!(file_plan = %file_plan, role = name, "created role");
        Ok(Role {
            name: name.to_string(),
            display_label: display_label.to_string(),
            capabilities: capabilities.clone(),
            role_group_name: authority,
        })
    }

    /// Replace the label and capability grants of a role
    pub async fn update_role(
        &self,
        file_plan: &NodeRef,
        name: &str,
        display_label: &str,
        capabilities: &BTreeSet<String>,
    ) -> CapabilityResult<Role> {
        let existing = self.require_role(file_plan, name).await?;
        self.check_capabilities(capabilities)?;

        for capability in &existing.capabilities {
            self.effects
                .delete_permission(file_plan, &existing.role_group_name, capability)
                .await?;
        }
        self.grant_all(file_plan, &existing.role_group_name, capabilities)
            .await?;
        self.effects
            .set_display_name(&existing.role_group_name, display_label)
            .await?;

        tracing::info!(file_plan = %file_plan, role = name, "updated role");
        Ok(Role {
            display_label: display_label.to_string(),
            capabilities: capabilities.clone(),
            ..existing
        })
    }

    /// Delete a role and its grants
    pub async fn delete_role(&self, file_plan: &NodeRef, name: &str) -> CapabilityResult<()> {
        let existing = self.require_role(file_plan, name).await?;
        for permission in self.effects.all_set_permissions(file_plan).await? {
            if permission.authority == existing.role_group_name {
                self.effects
                    .delete_permission(file_plan, &existing.role_group_name, &permission.permission)
                    .await?;
            }
        }
        self.effects.delete_group(&existing.role_group_name).await?;
        tracing::info!(file_plan = %file_plan, role = name, "deleted role");
        Ok(())
    }

    /// Whether the user holds the administrator role
    pub async fn has_admin_role(&self, file_plan: &NodeRef, user: &UserName) -> CapabilityResult<bool> {
        Ok(self
            .get_roles_by_user(file_plan, user, true)
            .await?
            .iter()
            .any(|role| role.name == ADMINISTRATOR_ROLE))
    }

    /// Put a user or group into a role
    pub async fn assign_role_to_authority(
        &self,
        file_plan: &NodeRef,
        name: &str,
        authority: &str,
    ) -> CapabilityResult<()> {
        let group = self.require_role_group(file_plan, name).await?;
        if self.effects.containing_groups(authority).await?.contains(&group) {
            return Ok(());
        }
        self.effects.add_authority(&group, authority).await?;
        tracing::debug!(file_plan = %file_plan, role = name, authority, "assigned role");
        Ok(())
    }

    /// Take a user or group out of a role
    ///
    /// Only direct membership is removed. An authority holding the role
    /// through another group keeps it.
    pub async fn unassign_role_from_authority(
        &self,
        file_plan: &NodeRef,
        name: &str,
        authority: &str,
    ) -> CapabilityResult<()> {
        let group = self.require_role_group(file_plan, name).await?;
        self.effects.remove_authority(&group, authority).await?;
        tracing::debug!(file_plan = %file_plan, role = name, authority, "unassigned role");
        Ok(())
    }

    /// Users holding a role, through any nesting of groups
    pub async fn users_assigned_to_role(
        &self,
        file_plan: &NodeRef,
        name: &str,
    ) -> CapabilityResult<BTreeSet<UserName>> {
        let group = self.require_role_group(file_plan, name).await?;
        Ok(self.effects.contained_users(&group).await?)
    }

    /// Groups holding a role, through any nesting of groups
    pub async fn groups_assigned_to_role(
        &self,
        file_plan: &NodeRef,
        name: &str,
    ) -> CapabilityResult<BTreeSet<String>> {
        let group = self.require_role_group(file_plan, name).await?;
        Ok(self.effects.contained_groups(&group).await?)
    }

    /// Every user and group authority holding a role
    pub async fn all_assigned_to_role(
        &self,
        file_plan: &NodeRef,
        name: &str,
    ) -> CapabilityResult<BTreeSet<String>> {
        let mut all = self.groups_assigned_to_role(file_plan, name).await?;
        all.extend(
            self.users_assigned_to_role(file_plan, name)
                .await?
                .into_iter()
                .map(|user| user.as_str().to_string()),
        );
        Ok(all)
    }

    async fn require_role_group(&self, file_plan: &NodeRef, name: &str) -> CapabilityResult<String> {
        if self.exists_role(file_plan, name).await? {
            Ok(role_authority(file_plan, name))
        } else {
            Err(CapabilityError::unknown_role(name, file_plan.id()))
        }
    }

    async fn require_role(&self, file_plan: &NodeRef, name: &str) -> CapabilityResult<Role> {
        self.get_role(file_plan, name)
            .await?
            .ok_or_else(|| CapabilityError::unknown_role(name, file_plan.id()))
    }

    fn check_capabilities(&self, capabilities: &BTreeSet<String>) -> CapabilityResult<()> {
        match capabilities.iter().find(|name| self.registry.get(name).is_none()) {
            Some(unknown) => Err(CapabilityError::UnknownCapability(unknown.clone())),
            None => Ok(()),
        }
    }

    async fn grant_all(
        &self,
        file_plan: &NodeRef,
        authority: &str,
        capabilities: &BTreeSet<String>,
    ) -> CapabilityResult<()> {
        for capability in capabilities {
            self.effects
                .set_permission(file_plan, authority, capability, true)
                .await?;
        }
        Ok(())
    }
}
