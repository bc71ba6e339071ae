//! Site effects

use crate::{Result, UserName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role name of site managers
pub const SITE_MANAGER_ROLE: &str = "SiteManager";

/// Summary of a collaboration site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Unique short name
    pub short_name: String,
    /// Display title
    pub title: String,
    /// Free-text description
    pub description: String,
}

/// Effect trait for site lookup and membership
#[async_trait]
pub trait SiteEffects: Send + Sync {
    /// Fetch a site by short name
    async fn get_site(&self, site: &str) -> Result<Option<SiteInfo>>;

    /// Whether the user is a member of the site
    async fn is_member(&self, site: &str, user: &UserName) -> Result<bool>;

    /// Role the user holds in the site
    async fn members_role(&self, site: &str, user: &UserName) -> Result<Option<String>>;

    /// Grant the user a role in the site, performed as `run_as`
    async fn set_membership(
        &self,
        site: &str,
        user: &UserName,
        role: &str,
        run_as: &UserName,
    ) -> Result<()>;

    /// Full group authority name backing a site role
    async fn site_role_group(&self, site: &str, role: &str) -> Result<String>;
}
