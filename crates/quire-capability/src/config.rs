//! Capability model configuration
//!
//! The model is TOML: declarative capabilities, composites and bootstrap
//! roles. The reference model ships with the crate and is what
//! [`CapabilityConfig::reference`] returns.

use crate::error::{CapabilityError, CapabilityResult};
use quire_core::config::{ConfigValidator, QuireConfig};
use quire_core::FilePlanComponentKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const REFERENCE_CONFIG: &str = include_str!("../config/capabilities.toml");

/// Declarative capability definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityEntry {
    /// Unique capability name
    pub name: String,
    /// UI grouping
    #[serde(default)]
    pub group: Option<String>,
    /// Applicable node kinds, `None` for every kind
    #[serde(default)]
    pub kinds: Option<Vec<FilePlanComponentKind>>,
    /// Condition name to required outcome
    #[serde(default)]
    pub conditions: BTreeMap<String, bool>,
    /// Actions this capability triggers
    #[serde(default)]
    pub actions: Vec<String>,
    /// Hidden from public enumeration
    #[serde(default)]
    pub private: bool,
    /// Underlying permission the permission model decides once the gates pass
    #[serde(default)]
    pub permission: Option<String>,
    /// Whether a held role must grant the capability
    #[serde(default = "grant_required")]
    pub requires_grant: bool,
}

fn grant_required() -> bool {
    true
}

/// Composite capability definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeEntry {
    /// Unique capability name
    pub name: String,
    /// Member capability names
    pub members: Vec<String>,
    /// UI grouping
    #[serde(default)]
    pub group: Option<String>,
}

/// Bootstrap role definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Role name
    pub name: String,
    /// Human-readable label
    pub display_label: String,
    /// Hidden unless system roles are requested
    #[serde(default)]
    pub system: bool,
    /// Also grant the filing permission on the file plan
    #[serde(default)]
    pub filing: bool,
    /// Grant every public capability
    #[serde(default)]
    pub all_capabilities: bool,
    /// Granted capability names
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

/// Aspect or property owned by records-management actions
///
/// The name may only change through one of its actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedEntry {
    /// Qualified aspect or property name
    pub name: String,
    /// Actions allowed to change it
    pub actions: Vec<String>,
}

/// Complete capability model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Declarative capabilities
    pub capabilities: Vec<CapabilityEntry>,
    /// Composite capabilities
    #[serde(default)]
    pub composites: Vec<CompositeEntry>,
    /// Bootstrap roles
    #[serde(default)]
    pub roles: Vec<RoleEntry>,
    /// Aspects only their actions may add or remove
    #[serde(default)]
    pub protected_aspects: Vec<ProtectedEntry>,
    /// Properties only their actions may change
    #[serde(default)]
    pub protected_properties: Vec<ProtectedEntry>,
}

impl CapabilityConfig {
    /// The reference records-management model
    pub fn reference() -> CapabilityResult<Self> {
        Self::from_toml_str(REFERENCE_CONFIG)
    }

    /// Names of every declared capability, composites included
    pub fn all_names(&self) -> BTreeSet<&str> {
        self.capabilities
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.composites.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Actions triggered by some declared capability
    pub fn action_names(&self) -> BTreeSet<&str> {
        self.capabilities
            .iter()
            .flat_map(|c| c.actions.iter().map(String::as_str))
            .collect()
    }

    /// Look up a bootstrap role
    pub fn role(&self, name: &str) -> Option<&RoleEntry> {
        self.roles.iter().find(|role| role.name == name)
    }
}

impl QuireConfig for CapabilityConfig {
    type Error = CapabilityError;

    fn validate(&self) -> CapabilityResult<()> {
        let mut validator = ConfigValidator::new();
        let names = self.all_names();

        validator.custom(
            "capabilities",
            &self.capabilities,
            |caps| !caps.is_empty(),
            "at least one capability is required",
        );
        validator.each("capabilities", &self.capabilities, |v, _, entry| {
            v.format("name", &entry.name, "identifier");
            if let Some(kinds) = &entry.kinds {
                v.custom("kinds", kinds, |k| !k.is_empty(), "use no list for every kind");
            }
            if let Some(permission) = &entry.permission {
                v.format("permission", permission, "identifier");
            }
            if !entry.requires_grant {
                v.required("permission", &entry.permission);
            }
        });
        validator.each("composites", &self.composites, |v, _, entry| {
            v.format("name", &entry.name, "identifier");
            v.custom("members", &entry.members, |m| !m.is_empty(), "must not be empty");
            for member in &entry.members {
                v.custom(
                    "members",
                    member.as_str(),
                    |m| names.contains(m),
                    &format!("unknown member '{member}'"),
                );
            }
        });
        validator.unique(
            "names",
            self.capabilities
                .iter()
                .map(|c| c.name.as_str())
                .chain(self.composites.iter().map(|c| c.name.as_str())),
        );

        validator.each("roles", &self.roles, |v, _, role| {
            v.format("name", &role.name, "identifier");
            v.non_empty("display_label", &role.display_label);
            for capability in &role.capabilities {
                v.custom(
                    "capabilities",
                    capability.as_str(),
                    |c| names.contains(c),
                    &format!("unknown capability '{capability}'"),
                );
            }
        });
        validator.unique("roles", self.roles.iter().map(|r| r.name.as_str()));

        let actions = self.action_names();
        for (field, entries) in [
            ("protected_aspects", &self.protected_aspects),
            ("protected_properties", &self.protected_properties),
        ] {
            validator.each(field, entries, |v, _, entry| {
                v.non_empty("name", &entry.name);
                v.custom("actions", &entry.actions, |a| !a.is_empty(), "must not be empty");
                for action in &entry.actions {
                    v.custom(
                        "actions",
                        action.as_str(),
                        |a| actions.contains(a),
                        &format!("no capability triggers '{action}'"),
                    );
                }
            });
            validator.unique(field, entries.iter().map(|e| e.name.as_str()));
        }

        validator
            .result()
            .map_err(|err| CapabilityError::invalid_config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_reference_config_loads() {
        let config = CapabilityConfig::reference().unwrap();
        assert_eq!(config.capabilities.len(), 59);
        assert_eq!(config.composites.len(), 4);
        assert_eq!(config.roles.len(), 5);

        let admin = config.role("Administrator").unwrap();
        assert!(admin.system && admin.all_capabilities);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let toml = r#"
            [[capabilities]]
            name = "ViewRecords"

            [[composites]]
            name = "ViewRecords"
            members = ["ViewRecords"]
        "#;
        assert_matches!(
            CapabilityConfig::from_toml_str(toml),
            Err(CapabilityError::InvalidConfig { message }) if message.contains("duplicate")
        );
    }

    #[test]
    fn test_role_with_unknown_capability_rejected() {
        let toml = r#"
            [[capabilities]]
            name = "ViewRecords"

            [[roles]]
            name = "Reader"
            display_label = "Reader"
            capabilities = ["ViewEverything"]
        "#;
        assert_matches!(
            CapabilityConfig::from_toml_str(toml),
            Err(CapabilityError::InvalidConfig { message }) if message.contains("ViewEverything")
        );
    }

    #[test]
    fn test_ungranted_capability_needs_a_permission() {
        let toml = r#"
            [[capabilities]]
            name = "ViewRecords"
            requires_grant = false
        "#;
        assert_matches!(
            CapabilityConfig::from_toml_str(toml),
            Err(CapabilityError::InvalidConfig { message })
                if message.contains("capabilities[0].permission")
        );

        let toml = r#"
            [[capabilities]]
            name = "DeleteLinks"
            permission = "DeleteChildren"
            requires_grant = false
        "#;
        let config = CapabilityConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.capabilities[0].permission.as_deref(), Some("DeleteChildren"));
    }

    #[test]
    fn test_protected_names_need_known_actions() {
        let config = CapabilityConfig::reference().unwrap();
        assert_eq!(config.protected_aspects.len(), 6);
        assert_eq!(config.protected_properties.len(), 13);

        let toml = r#"
            [[capabilities]]
            name = "Unfreeze"
            actions = ["unfreeze"]

            [[protected_aspects]]
            name = "rma:frozen"
            actions = ["unfreeze", "thaw"]
        "#;
        assert_matches!(
            CapabilityConfig::from_toml_str(toml),
            Err(CapabilityError::InvalidConfig { message })
                if message.contains("protected_aspects[0].actions") && message.contains("thaw")
        );
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let toml = r#"
            [[capabilities]]
            name = "ViewRecords"
            kinds = ["Folder"]
        "#;
        assert_matches!(
            CapabilityConfig::from_toml_str(toml),
            Err(CapabilityError::Core(quire_core::QuireError::Invalid { .. }))
        );
    }
}
