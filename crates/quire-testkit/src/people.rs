//! In-memory people and accounts

use crate::MockEffects;
use async_trait::async_trait;
use quire_core::effects::{AuthenticationEffects, Person, PersonEffects};
use quire_core::{QuireError, Result, UserName};
use std::collections::BTreeMap;

#[derive(Debug)]
pub(crate) struct PeopleState {
    pub(crate) persons: BTreeMap<UserName, Person>,
    accounts: BTreeMap<UserName, Account>,
    creation_allowed: bool,
}

impl Default for PeopleState {
    fn default() -> Self {
        Self {
            persons: BTreeMap::new(),
            accounts: BTreeMap::new(),
            creation_allowed: true,
        }
    }
}

/// Stored account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Password as set
    pub password: String,
    /// Enabled flag
    pub enabled: bool,
    /// Whether the account store can be modified
    pub mutable: bool,
}

impl MockEffects {
    /// Add an enabled person with an enabled, mutable account
    pub fn add_user(&self, user_name: &str, first: &str, last: &str, email: &str) -> UserName {
        let user = UserName::new(user_name);
        let mut state = self.state.lock();
        state
            .people
            .persons
            .insert(user.clone(), Person::new(user.clone(), first, last, email));
        state.people.accounts.insert(
            user.clone(),
            Account {
                password: "secret".to_string(),
                enabled: true,
                mutable: true,
            },
        );
        user
    }

    /// Fetch a stored account
    pub fn account(&self, user: &UserName) -> Option<Account> {
        self.state.lock().people.accounts.get(user).cloned()
    }

    /// Set the person-level enabled flag
    pub fn set_person_enabled(&self, user: &UserName, enabled: bool) {
        if let Some(person) = self.state.lock().people.persons.get_mut(user) {
            person.enabled = enabled;
        }
    }

    /// Mark an account as living in a read-only store
    pub fn set_account_mutable(&self, user: &UserName, mutable: bool) {
        if let Some(account) = self.state.lock().people.accounts.get_mut(user) {
            account.mutable = mutable;
        }
    }

    /// Allow or forbid account creation
    pub fn set_authentication_creation_allowed(&self, allowed: bool) {
        self.state.lock().people.creation_allowed = allowed;
    }
}

#[async_trait]
impl PersonEffects for MockEffects {
    async fn person_exists(&self, user: &UserName) -> Result<bool> {
        Ok(self.state.lock().people.persons.contains_key(user))
    }

    async fn get_person(&self, user: &UserName) -> Result<Option<Person>> {
        Ok(self.state.lock().people.persons.get(user).cloned())
    }

    async fn people_by_email(&self, email: &str, limit: usize) -> Result<Vec<Person>> {
        Ok(self
            .state
            .lock()
            .people
            .persons
            .values()
            .filter(|person| person.email.eq_ignore_ascii_case(email))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_person(&self, person: Person) -> Result<()> {
        let mut state = self.state.lock();
        if state.people.persons.contains_key(&person.user_name) {
            return Err(QuireError::invalid(format!(
                "person {} already exists",
                person.user_name
            )));
        }
        state.people.persons.insert(person.user_name.clone(), person);
        Ok(())
    }

    async fn delete_person(&self, user: &UserName) -> Result<()> {
        self.state
            .lock()
            .people
            .persons
            .remove(user)
            .map(|_| ())
            .ok_or_else(|| QuireError::not_found(format!("person {user}")))
    }

    async fn set_annullable(&self, user: &UserName, annullable: bool) -> Result<()> {
        let mut state = self.state.lock();
        let person = state
            .people
            .persons
            .get_mut(user)
            .ok_or_else(|| QuireError::not_found(format!("person {user}")))?;
        person.annullable = annullable;
        Ok(())
    }
}

#[async_trait]
impl AuthenticationEffects for MockEffects {
    async fn authentication_creation_allowed(&self) -> Result<bool> {
        Ok(self.state.lock().people.creation_allowed)
    }

    async fn authentication_exists(&self, user: &UserName) -> Result<bool> {
        Ok(self.state.lock().people.accounts.contains_key(user))
    }

    async fn create_authentication(&self, user: &UserName, password: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.people.accounts.contains_key(user) {
            return Err(QuireError::invalid(format!("account {user} already exists")));
        }
        state.people.accounts.insert(
            user.clone(),
            Account {
                password: password.to_string(),
                enabled: true,
                mutable: true,
            },
        );
        Ok(())
    }

    async fn set_authentication_enabled(&self, user: &UserName, enabled: bool) -> Result<()> {
        let mut state = self.state.lock();
        let account = state
            .people
            .accounts
            .get_mut(user)
            .ok_or_else(|| QuireError::not_found(format!("account {user}")))?;
        account.enabled = enabled;
        Ok(())
    }

    async fn is_authentication_enabled(&self, user: &UserName) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .people
            .accounts
            .get(user)
            .map_or(false, |account| account.enabled))
    }

    async fn is_authentication_mutable(&self, user: &UserName) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .people
            .accounts
            .get(user)
            .map_or(false, |account| account.mutable))
    }

    async fn delete_authentication(&self, user: &UserName) -> Result<()> {
        self.state
            .lock()
            .people
            .accounts
            .remove(user)
            .map(|_| ())
            .ok_or_else(|| QuireError::not_found(format!("account {user}")))
    }
}
