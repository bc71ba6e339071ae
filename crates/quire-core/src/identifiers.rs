//! Node and user identifiers
//!
//! Both are opaque string newtypes. A `NodeRef` follows the
//! `<protocol>://<store>/<id>` shape; only the trailing id segment carries
//! meaning for the engines (it keys role zones and group names).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a repository node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef(pub String);

impl NodeRef {
    /// Create a node reference from any string-like value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Create a reference in the default workspace store
    pub fn workspace(id: impl AsRef<str>) -> Self {
        Self(format!("workspace://SpacesStore/{}", id.as_ref()))
    }

    /// Get the full reference string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The trailing id segment of the reference
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Name of the built-in system user
pub const SYSTEM_USER_NAME: &str = "System";

/// Identifier of a repository user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserName(pub String);

impl UserName {
    /// Create a user name from any string-like value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The built-in system user
    pub fn system() -> Self {
        Self(SYSTEM_USER_NAME.to_string())
    }

    /// Whether this is the built-in system user
    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_USER_NAME
    }

    /// Get the user name string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for UserName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for UserName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
