//! In-memory sites, outbound mail and queued actions

use crate::MockEffects;
use async_trait::async_trait;
use quire_core::effects::{ActionEffects, AsyncAction, MailMessage, SiteEffects, SiteInfo};
use quire_core::{QuireError, Result, UserName};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub(crate) struct SiteState {
    sites: BTreeMap<String, SiteRecord>,
    grants: Vec<MembershipGrant>,
    outbox: Vec<MailMessage>,
    queued: Vec<AsyncAction>,
    fail_mail: bool,
    fail_async: bool,
}

#[derive(Debug)]
struct SiteRecord {
    info: SiteInfo,
    members: BTreeMap<UserName, String>,
}

/// A recorded `set_membership` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipGrant {
    /// Site short name
    pub site: String,
    /// User granted
    pub user: UserName,
    /// Role granted
    pub role: String,
    /// Identity the grant ran as
    pub run_as: UserName,
}

impl MockEffects {
    /// Create a site
    pub fn create_site(&self, short_name: &str, title: &str, description: &str) {
        self.state.lock().sites.sites.insert(
            short_name.to_string(),
            SiteRecord {
                info: SiteInfo {
                    short_name: short_name.to_string(),
                    title: title.to_string(),
                    description: description.to_string(),
                },
                members: BTreeMap::new(),
            },
        );
    }

    /// Remove a site
    pub fn remove_site(&self, short_name: &str) {
        self.state.lock().sites.sites.remove(short_name);
    }

    /// Give a user a role in a site without recording a grant
    pub fn add_site_member(&self, site: &str, user: &UserName, role: &str) {
        if let Some(record) = self.state.lock().sites.sites.get_mut(site) {
            record.members.insert(user.clone(), role.to_string());
        }
    }

    /// Every recorded membership grant
    pub fn membership_grants(&self) -> Vec<MembershipGrant> {
        self.state.lock().sites.grants.clone()
    }

    /// Every mail sent so far
    pub fn sent_mail(&self) -> Vec<MailMessage> {
        self.state.lock().sites.outbox.clone()
    }

    /// Make subsequent mail sends fail
    pub fn fail_mail(&self, fail: bool) {
        self.state.lock().sites.fail_mail = fail;
    }

    /// Make subsequent asynchronous submissions fail
    pub fn fail_async(&self, fail: bool) {
        self.state.lock().sites.fail_async = fail;
    }

    /// Take the queued asynchronous actions
    pub fn drain_async_actions(&self) -> Vec<AsyncAction> {
        std::mem::take(&mut self.state.lock().sites.queued)
    }
}

#[async_trait]
impl SiteEffects for MockEffects {
    async fn get_site(&self, site: &str) -> Result<Option<SiteInfo>> {
        Ok(self
            .state
            .lock()
            .sites
            .sites
            .get(site)
            .map(|record| record.info.clone()))
    }

    async fn is_member(&self, site: &str, user: &UserName) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .sites
            .sites
            .get(site)
            .map_or(false, |record| record.members.contains_key(user)))
    }

    async fn members_role(&self, site: &str, user: &UserName) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .sites
            .sites
            .get(site)
            .and_then(|record| record.members.get(user).cloned()))
    }

    async fn set_membership(
        &self,
        site: &str,
        user: &UserName,
        role: &str,
        run_as: &UserName,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let record = state
            .sites
            .sites
            .get_mut(site)
            .ok_or_else(|| QuireError::not_found(format!("site {site}")))?;
        record.members.insert(user.clone(), role.to_string());
        state.sites.grants.push(MembershipGrant {
            site: site.to_string(),
            user: user.clone(),
            role: role.to_string(),
            run_as: run_as.clone(),
        });
        Ok(())
    }

    async fn site_role_group(&self, site: &str, role: &str) -> Result<String> {
        Ok(format!("GROUP_site_{site}_{role}"))
    }
}

#[async_trait]
impl ActionEffects for MockEffects {
    async fn send_mail(&self, message: MailMessage) -> Result<()> {
        let mut state = self.state.lock();
        if state.sites.fail_mail {
            return Err(QuireError::internal("mail transport unavailable"));
        }
        tracing::debug!(to = ?message.to, template = %message.template, "mock mail sent");
        state.sites.outbox.push(message);
        Ok(())
    }

    async fn execute_async(&self, action: AsyncAction) -> Result<()> {
        let mut state = self.state.lock();
        if state.sites.fail_async {
            return Err(QuireError::internal("action executor unavailable"));
        }
        state.sites.queued.push(action);
        Ok(())
    }
}
