//! Tri-state access verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an access evaluation
///
/// `Undetermined` means the evaluation could not decide on its own; callers
/// treat it as "not allowed" unless another rule grants access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessStatus {
    /// Access is granted
    Allowed,
    /// Access is refused
    Denied,
    /// No rule decided
    Undetermined,
}

impl AccessStatus {
    /// Whether access is granted
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Map a boolean decision to `Allowed` / `Denied`
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Allowed
        } else {
            Self::Denied
        }
    }

    /// Canonical upper-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "ALLOWED",
            Self::Denied => "DENIED",
            Self::Undetermined => "UNDETERMINED",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&AccessStatus::Undetermined).unwrap();
        assert_eq!(json, "\"UNDETERMINED\"");
        assert_eq!(AccessStatus::from_bool(false), AccessStatus::Denied);
    }
}
