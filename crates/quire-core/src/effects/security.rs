//! Security and authentication effects

use crate::{Result, UserName};
use async_trait::async_trait;

/// Effect trait for the security context of the running operation
#[async_trait]
pub trait SecurityEffects: Send + Sync {
    /// The user on whose behalf the operation runs
    async fn current_user(&self) -> Result<UserName>;
}

/// Effect trait for account (authentication) management
#[async_trait]
pub trait AuthenticationEffects: Send + Sync {
    /// Whether new accounts may be created at all
    async fn authentication_creation_allowed(&self) -> Result<bool>;

    /// Whether an account exists for the user
    async fn authentication_exists(&self, user: &UserName) -> Result<bool>;

    /// Create an account with the given password
    async fn create_authentication(&self, user: &UserName, password: &str) -> Result<()>;

    /// Enable or disable an account
    async fn set_authentication_enabled(&self, user: &UserName, enabled: bool) -> Result<()>;

    /// Whether the account is enabled
    async fn is_authentication_enabled(&self, user: &UserName) -> Result<bool>;

    /// Whether the account lives in a store that can be modified
    async fn is_authentication_mutable(&self, user: &UserName) -> Result<bool>;

    /// Delete an account
    async fn delete_authentication(&self, user: &UserName) -> Result<()>;
}
