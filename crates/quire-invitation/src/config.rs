//! Invitation engine configuration

use crate::error::{keys, InvitationError, InvitationResult};
use crate::workflow::WorkflowEngine;
use quire_core::config::{ConfigValidator, QuireConfig};
use serde::{Deserialize, Serialize};

/// Configuration for [`crate::InvitationService`]
///
/// ```toml
/// engine = "jbpm"
/// search_limit = 50
/// send_emails = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvitationConfig {
    /// Workflow engine backing the invitation processes
    pub engine: WorkflowEngine,
    /// Override for the nominated definition used for existing users
    pub nominated_definition: Option<String>,
    /// Override for the nominated definition used for provisioned users
    pub nominated_external_definition: Option<String>,
    /// Override for the moderated definition
    pub moderated_definition: Option<String>,
    /// Attempts at finding a free generated user name
    pub max_user_name_retries: usize,
    /// Result cap of the public search
    pub search_limit: usize,
    /// Whether invite mail is sent
    pub send_emails: bool,
    /// Server path used when a request names none
    pub server_path: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            engine: WorkflowEngine::Activiti,
            nominated_definition: None,
            nominated_external_definition: None,
            moderated_definition: None,
            max_user_name_retries: 10,
            search_limit: 200,
            send_emails: true,
            server_path: "http://localhost:8080/share".to_string(),
        }
    }
}

impl InvitationConfig {
    /// Configuration for tests: no mail
    pub fn testing() -> Self {
        Self {
            send_emails: false,
            ..Self::default()
        }
    }
}

impl QuireConfig for InvitationConfig {
    type Error = InvitationError;

    fn validate(&self) -> InvitationResult<()> {
        let mut validator = ConfigValidator::new();
        validator
            .range(
                "max_user_name_retries",
                u32::try_from(self.max_user_name_retries).unwrap_or(u32::MAX),
                Some(1),
                Some(1000),
            )
            .range(
                "search_limit",
                u32::try_from(self.search_limit).unwrap_or(u32::MAX),
                Some(1),
                None,
            )
            .non_empty("server_path", &self.server_path);
        for (field, name) in [
            ("nominated_definition", &self.nominated_definition),
            ("nominated_external_definition", &self.nominated_external_definition),
            ("moderated_definition", &self.moderated_definition),
        ] {
            if let Some(name) = name {
                validator.custom(
                    field,
                    name,
                    |name| name.split('$').count() == 2,
                    "definition names are <engine>$<name>",
                );
            }
        }
        validator
            .result()
            .map_err(|e| InvitationError::system(keys::INVALID_CONFIG, [e.to_string()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = InvitationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_user_name_retries, 10);
        assert_eq!(config.search_limit, 200);
        assert!(config.send_emails);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = InvitationConfig::from_toml_str(
            r#"
            engine = "jbpm"
            search_limit = 50
            send_emails = false
            "#,
        )
        .unwrap();
        assert_eq!(config.engine, WorkflowEngine::Jbpm);
        assert_eq!(config.search_limit, 50);
        assert!(!config.send_emails);
        assert_eq!(config.max_user_name_retries, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = InvitationConfig::from_toml_str("search_limit = 0").unwrap_err();
        assert_eq!(err.key(), Some(keys::INVALID_CONFIG));

        let err = InvitationConfig::from_toml_str(r#"moderated_definition = "moderated""#).unwrap_err();
        assert_eq!(err.key(), Some(keys::INVALID_CONFIG));

        let err = InvitationConfig::from_toml_str(r#"engine = "bpmn""#).unwrap_err();
        assert!(matches!(err, InvitationError::Core(_)));
    }
}
