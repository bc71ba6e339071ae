//! Protected aspects and properties
//!
//! Records-management actions own some aspects and properties: the frozen
//! aspect belongs to freeze and unfreeze, the disposition date to the
//! disposition actions. Such a name is protected on a node unless one of its
//! owning actions is executable there for the caller; evaluation of that part
//! lives on [`crate::CapabilityService`].

use crate::config::{CapabilityConfig, ProtectedEntry};
use std::collections::BTreeMap;

/// Protected names and the actions owning each
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectionRegistry {
    aspects: BTreeMap<String, Vec<String>>,
    properties: BTreeMap<String, Vec<String>>,
}

impl ProtectionRegistry {
    /// Build from the protected entries of a configuration
    pub fn from_config(config: &CapabilityConfig) -> Self {
        Self {
            aspects: owners(&config.protected_aspects),
            properties: owners(&config.protected_properties),
        }
    }

    /// Names of the protected aspects
    pub fn protected_aspects(&self) -> impl Iterator<Item = &str> {
        self.aspects.keys().map(String::as_str)
    }

    /// Names of the protected properties
    pub fn protected_properties(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Actions owning an aspect, `None` when it is not protected
    pub fn aspect_actions(&self, aspect: &str) -> Option<&[String]> {
        self.aspects.get(aspect).map(Vec::as_slice)
    }

    /// Actions owning a property, `None` when it is not protected
    pub fn property_actions(&self, property: &str) -> Option<&[String]> {
        self.properties.get(property).map(Vec::as_slice)
    }
}

fn owners(entries: &[ProtectedEntry]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|entry| (entry.name.clone(), entry.actions.clone()))
        .collect()
}
