//! Capability registry
//!
//! Built once from a [`CapabilityConfig`] and a [`ConditionTable`]; read-only
//! afterwards. Condition names, composite members and composite acyclicity
//! are all checked here, so evaluation never meets an unresolved reference.

use crate::capability::{Capability, CapabilityDefinition, DeclarativeCapability};
use crate::condition::ConditionTable;
use crate::config::{CapabilityConfig, CompositeEntry};
use crate::error::{CapabilityError, CapabilityResult};
use crate::protection::ProtectionRegistry;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Read-only name to capability registry, in configuration order
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: IndexMap<String, Arc<Capability>>,
    protection: ProtectionRegistry,
}

impl CapabilityRegistry {
    /// Registry for the reference model with the built-in conditions
    pub fn reference() -> CapabilityResult<Self> {
        Self::from_config(&CapabilityConfig::reference()?, &ConditionTable::builtin())
    }

    /// Build a registry from configuration
    pub fn from_config(
        config: &CapabilityConfig,
        conditions: &ConditionTable,
    ) -> CapabilityResult<Self> {
        let mut capabilities = IndexMap::new();

        for entry in &config.capabilities {
            let resolved = entry
                .conditions
                .iter()
                .map(|(name, expected)| {
                    conditions
                        .get(name)
                        .map(|condition| (condition, *expected))
                        .ok_or_else(|| CapabilityError::UnknownCondition {
                            capability: entry.name.clone(),
                            condition: name.clone(),
                        })
                })
                .collect::<CapabilityResult<Vec<_>>>()?;

            let definition = CapabilityDefinition::Declarative(DeclarativeCapability {
                kinds: entry.kinds.clone(),
                conditions: resolved,
                permission: entry.permission.clone(),
                requires_grant: entry.requires_grant,
            });
            let capability = Capability::new(
                entry.name.clone(),
                entry.group.clone(),
                entry.private,
                entry.actions.iter().cloned(),
                definition,
            );
            capabilities.insert(entry.name.clone(), Arc::new(capability));
        }

        let composites: HashMap<&str, &CompositeEntry> = config
            .composites
            .iter()
            .map(|entry| (entry.name.as_str(), entry))
            .collect();
        let mut built = HashMap::new();
        for entry in &config.composites {
            let mut path = Vec::new();
            resolve_composite(entry, &composites, &capabilities, &mut built, &mut path)?;
        }
        for entry in &config.composites {
            if let Some(capability) = built.remove(entry.name.as_str()) {
                capabilities.insert(entry.name.clone(), capability);
            }
        }

        tracing::debug!(
            capabilities = capabilities.len(),
            composites = config.composites.len(),
            "capability registry built"
        );
        Ok(Self {
            capabilities,
            protection: ProtectionRegistry::from_config(config),
        })
    }

    /// Look up a capability by name
    pub fn get(&self, name: &str) -> Option<Arc<Capability>> {
        self.capabilities.get(name).cloned()
    }

    /// Protected aspects and properties
    pub fn protection(&self) -> &ProtectionRegistry {
        &self.protection
    }

    /// Public capabilities, in configuration order
    pub fn capabilities(&self) -> Vec<Arc<Capability>> {
        self.capabilities
            .values()
            .filter(|capability| !capability.is_private())
            .cloned()
            .collect()
    }

    /// Every capability, private ones included
    pub fn all(&self) -> Vec<Arc<Capability>> {
        self.capabilities.values().cloned().collect()
    }

    /// Number of registered capabilities, private ones included
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Capabilities that trigger the named action
    pub fn by_action(&self, action: &str) -> Vec<Arc<Capability>> {
        self.capabilities
            .values()
            .filter(|capability| capability.action_names().contains(action))
            .cloned()
            .collect()
    }

    /// Public capabilities keyed by group; ungrouped ones are omitted
    pub fn groups(&self) -> BTreeMap<String, Vec<Arc<Capability>>> {
        let mut groups: BTreeMap<String, Vec<Arc<Capability>>> = BTreeMap::new();
        for capability in self.capabilities.values().filter(|c| !c.is_private()) {
            if let Some(group) = capability.group() {
                groups
                    .entry(group.to_string())
                    .or_default()
                    .push(Arc::clone(capability));
            }
        }
        groups
    }
}

fn resolve_composite<'a>(
    entry: &'a CompositeEntry,
    composites: &HashMap<&'a str, &'a CompositeEntry>,
    declared: &IndexMap<String, Arc<Capability>>,
    built: &mut HashMap<&'a str, Arc<Capability>>,
    path: &mut Vec<&'a str>,
) -> CapabilityResult<Arc<Capability>> {
    if let Some(existing) = built.get(entry.name.as_str()) {
        return Ok(Arc::clone(existing));
    }
    if path.contains(&entry.name.as_str()) {
        let mut cycle: Vec<String> = path
            .iter()
            .skip_while(|name| **name != entry.name)
            .map(|name| name.to_string())
            .collect();
        cycle.push(entry.name.clone());
        return Err(CapabilityError::CompositeCycle { path: cycle });
    }

    path.push(entry.name.as_str());
    let mut members = Vec::with_capacity(entry.members.len());
    for member in &entry.members {
        let capability = match composites.get(member.as_str()).copied() {
            Some(composite) => resolve_composite(composite, composites, declared, built, path)?,
            None => declared
                .get(member)
                .cloned()
                .ok_or_else(|| CapabilityError::UnknownCapability(member.clone()))?,
        };
        members.push(capability);
    }
    path.pop();

    let capability = Arc::new(Capability::new(
        entry.name.clone(),
        entry.group.clone(),
        true,
        Vec::new(),
        CapabilityDefinition::Composite(members),
    ));
    built.insert(entry.name.as_str(), Arc::clone(&capability));
    Ok(capability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use quire_core::config::QuireConfig;

    #[test]
    fn test_reference_registry() {
        let registry = CapabilityRegistry::reference().unwrap();
        assert_eq!(registry.len(), 63);
        assert_eq!(registry.capabilities().len(), 59);

        let update = registry.get("Update").unwrap();
        assert!(update.is_private());
        let members: Vec<&str> = update.members().iter().map(|m| m.name()).collect();
        assert_eq!(members[0], "UpdateProperties");
        assert_eq!(update.members()[0].members().len(), 3);
    }

    #[test]
    fn test_by_action() {
        let registry = CapabilityRegistry::reference().unwrap();
        let declaring: Vec<String> = registry
            .by_action("declareRecord")
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(declaring, ["DeclareRecords", "DeclareRecordsInClosedFolders"]);
        assert!(registry.by_action("noSuchAction").is_empty());
    }

    #[test]
    fn test_groups_cover_public_capabilities() {
        let registry = CapabilityRegistry::reference().unwrap();
        let grouped: usize = registry.groups().values().map(Vec::len).sum();
        assert_eq!(grouped, 59);
        assert_eq!(registry.groups()["hold"].len(), 3);
    }

    #[test]
    fn test_unknown_condition_rejected_at_load() {
        let config = CapabilityConfig::from_toml_str(
            r#"
            [[capabilities]]
            name = "CloseFolders"
            conditions = { isOpen = true }
            "#,
        )
        .unwrap();
        assert_matches!(
            CapabilityRegistry::from_config(&config, &ConditionTable::builtin()),
            Err(CapabilityError::UnknownCondition { condition, .. }) if condition == "isOpen"
        );
    }

    #[test]
    fn test_composite_cycle_rejected() {
        let config = CapabilityConfig::from_toml_str(
            r#"
            [[capabilities]]
            name = "ViewRecords"

            [[composites]]
            name = "A"
            members = ["ViewRecords", "B"]

            [[composites]]
            name = "B"
            members = ["A"]
            "#,
        )
        .unwrap();
        assert_matches!(
            CapabilityRegistry::from_config(&config, &ConditionTable::builtin()),
            Err(CapabilityError::CompositeCycle { path }) if path == ["A", "B", "A"]
        );
    }
}
