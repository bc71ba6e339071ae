//! Invitation identifiers

use crate::error::{keys, InvitationError, InvitationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '$';

/// Workflow-instance id of an invitation, `<engine>$<local id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvitationId(String);

impl InvitationId {
    /// Validate and wrap an id
    pub fn parse(value: &str) -> InvitationResult<Self> {
        let mut parts = value.split(SEPARATOR);
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(engine), Some(local), None) if !engine.is_empty() && !local.is_empty()
        );
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(InvitationError::user_error(keys::INVALID_ID, [value]))
        }
    }

    /// Engine prefix
    pub fn engine(&self) -> &str {
        self.0.split(SEPARATOR).next().unwrap_or_default()
    }

    /// Engine-local part
    pub fn local_id(&self) -> &str {
        self.0.split(SEPARATOR).nth(1).unwrap_or_default()
    }

    /// Full id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvitationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InvitationId {
    type Err = InvitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InvitationId {
    type Error = InvitationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InvitationId> for String {
    fn from(id: InvitationId) -> Self {
        id.0
    }
}

impl AsRef<str> for InvitationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let id = InvitationId::parse("activiti$42").unwrap();
        assert_eq!(id.engine(), "activiti");
        assert_eq!(id.local_id(), "42");
        assert_eq!(id.to_string(), "activiti$42");
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for bad in ["", "42", "activiti$", "$42", "a$b$c", "jbpm42"] {
            let err = InvitationId::parse(bad).unwrap_err();
            assert_eq!(err.key(), Some(keys::INVALID_ID), "{bad}");
        }
    }

    #[test]
    fn test_serde_validates() {
        let id: InvitationId = serde_json::from_str("\"jbpm$7\"").unwrap();
        assert_eq!(id.local_id(), "7");
        assert!(serde_json::from_str::<InvitationId>("\"nope\"").is_err());
    }
}
