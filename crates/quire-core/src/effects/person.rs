//! Person effects

use crate::{Result, UserName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A person record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique user name
    pub user_name: UserName,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Mail address
    pub email: String,
    /// Person-level enabled flag (independent of the account)
    pub enabled: bool,
    /// Marked as removable if an invitation is abandoned
    pub annullable: bool,
}

impl Person {
    /// Create an enabled, non-annullable person
    pub fn new(
        user_name: impl Into<UserName>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            enabled: true,
            annullable: false,
        }
    }
}

/// Effect trait for person records
#[async_trait]
pub trait PersonEffects: Send + Sync {
    /// Whether a person exists
    async fn person_exists(&self, user: &UserName) -> Result<bool>;

    /// Fetch a person
    async fn get_person(&self, user: &UserName) -> Result<Option<Person>>;

    /// People whose mail address matches exactly, up to `limit`
    async fn people_by_email(&self, email: &str, limit: usize) -> Result<Vec<Person>>;

    /// Create a person; fails with `Invalid` when the user name is taken
    async fn create_person(&self, person: Person) -> Result<()>;

    /// Delete a person
    async fn delete_person(&self, user: &UserName) -> Result<()>;

    /// Set or clear the annullable marker
    async fn set_annullable(&self, user: &UserName, annullable: bool) -> Result<()>;
}
