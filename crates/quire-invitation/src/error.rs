//! Invitation error taxonomy
//!
//! Each caller-facing variant carries a message key plus its arguments so
//! upstream layers can localise the text.

use quire_core::QuireError;

/// Message keys used by [`InvitationError`]
pub mod keys {
    /// No invitation with the given id
    pub const NOT_FOUND: &str = "invitation.error.not_found";
    /// No pending moderated invitation for an invitee and site
    pub const NOT_FOUND_BY_INVITEE: &str = "invitation.error.not_found_by_invitee";
    /// Id is not `<engine>$<id>`
    pub const INVALID_ID: &str = "invitation.error.invalid_inviteId_format";
    /// Supplied ticket does not match the issued one
    pub const INVALID_TICKET: &str = "invitation.error.invalid_ticket";
    /// Operation does not apply to this kind of invitation
    pub const WRONG_TYPE: &str = "invitation.error.wrong_type";
    /// Workflow definition is not deployed
    pub const NO_WORKFLOW: &str = "invitation.error.noworkflow";
    /// A required task property is missing
    pub const MISSING_PROPERTY: &str = "invitation.error.missing_property";
    /// Site does not exist
    pub const SITE_NOT_FOUND: &str = "invitation.error.site_not_found";
    /// Person does not exist
    pub const PERSON_NOT_FOUND: &str = "invitation.error.person_not_found";
    /// Pending or review task is gone
    pub const ALREADY_FINISHED: &str = "invitation.invite.already_finished";
    /// Invitee already belongs to the site
    pub const ALREADY_MEMBER: &str = "invitation.invite.already_member";
    /// Invitee person is disabled
    pub const USER_DISABLED: &str = "invitation.invite.user_disabled";
    /// Caller is not a site manager
    pub const NOT_SITE_MANAGER: &str = "invitation.invite.not_site_manager";
    /// Caller may not cancel this invitation
    pub const CANCEL_NOT_SITE_MANAGER: &str = "invitation.cancel.not_site_manager";
    /// Accounts cannot be created by the authentication chain
    pub const AUTHENTICATION_CHAIN: &str = "invitation.invite.authentication_chain";
    /// Every generated user name was taken
    pub const UNABLE_GENERATE_ID: &str = "invitation.invite.unable_generate_id";
    /// Configuration rejected at startup
    pub const INVALID_CONFIG: &str = "invitation.error.invalid_config";
}

/// Errors raised by the invitation engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvitationError {
    /// Lookup miss
    #[error("Invitation not found ({key}): {}", .args.join(", "))]
    NotFound {
        /// Message key
        key: String,
        /// Message arguments
        args: Vec<String>,
    },

    /// Caller-correctable request error
    #[error("Invitation request error ({key}): {}", .args.join(", "))]
    UserError {
        /// Message key
        key: String,
        /// Message arguments
        args: Vec<String>,
    },

    /// Authorization failure
    #[error("Invitation forbidden ({key}): {}", .args.join(", "))]
    Forbidden {
        /// Message key
        key: String,
        /// Message arguments
        args: Vec<String>,
    },

    /// Configuration or system failure
    #[error("Invitation system error ({key}): {}", .args.join(", "))]
    System {
        /// Message key
        key: String,
        /// Message arguments
        args: Vec<String>,
    },

    /// Effect failure
    #[error(transparent)]
    Core(#[from] QuireError),
}

fn owned<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter().map(Into::into).collect()
}

impl InvitationError {
    /// Create a not-found error
    pub fn not_found<I, S>(key: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NotFound {
            key: key.to_string(),
            args: owned(args),
        }
    }

    /// Create a user error
    pub fn user_error<I, S>(key: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UserError {
            key: key.to_string(),
            args: owned(args),
        }
    }

    /// Create a forbidden error
    pub fn forbidden<I, S>(key: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Forbidden {
            key: key.to_string(),
            args: owned(args),
        }
    }

    /// Create a system error
    pub fn system<I, S>(key: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::System {
            key: key.to_string(),
            args: owned(args),
        }
    }

    /// Message key, if the error carries one
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::NotFound { key, .. }
            | Self::UserError { key, .. }
            | Self::Forbidden { key, .. }
            | Self::System { key, .. } => Some(key),
            Self::Core(_) => None,
        }
    }

    /// Whether this is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for invitation operations
pub type InvitationResult<T> = std::result::Result<T, InvitationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InvitationError::user_error(keys::ALREADY_MEMBER, ["bob", "bob@x.org", "alpha"]);
        assert_eq!(
            err.to_string(),
            "Invitation request error (invitation.invite.already_member): bob, bob@x.org, alpha"
        );
        assert_eq!(err.key(), Some(keys::ALREADY_MEMBER));

        let core: InvitationError = QuireError::storage("disk").into();
        assert_eq!(core.to_string(), "Storage error: disk");
        assert_eq!(core.key(), None);
    }
}
