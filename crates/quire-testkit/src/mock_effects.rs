//! Mock effects implementation for testing
//!
//! `MockEffects` implements every Quire effect trait over shared in-memory
//! state. Clones share state, so a test can hold one handle while the engine
//! under test holds another.
//!
//! Time is deterministic: the clock starts at 2022-01-01 00:00:00 UTC and
//! advances one second each time it is read.

use crate::repository::RepositoryState;
use crate::people::PeopleState;
use crate::sites::SiteState;
use crate::workflow::WorkflowState;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use quire_core::effects::{PhysicalTimeEffects, SecurityEffects};
use quire_core::{Result, UserName};
use std::sync::Arc;

/// Mock effects implementation for deterministic testing
#[derive(Debug, Clone)]
pub struct MockEffects {
    pub(crate) state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
pub(crate) struct MockState {
    pub(crate) current_user: UserName,
    pub(crate) now: DateTime<Utc>,
    pub(crate) repository: RepositoryState,
    pub(crate) people: PeopleState,
    pub(crate) sites: SiteState,
    pub(crate) workflow: WorkflowState,
}

impl MockState {
    pub(crate) fn tick(&mut self) -> DateTime<Utc> {
        self.now += Duration::seconds(1);
        self.now
    }
}

impl MockEffects {
    /// Empty state acting as the system user
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                current_user: UserName::system(),
                now: Utc.timestamp_opt(1_640_995_200, 0).unwrap(),
                repository: RepositoryState::default(),
                people: PeopleState::default(),
                sites: SiteState::default(),
                workflow: WorkflowState::default(),
            })),
        }
    }

    /// Act as the given user for subsequent calls
    pub fn set_current_user(&self, user: impl Into<UserName>) {
        self.state.lock().current_user = user.into();
    }

    /// Act as the system user for subsequent calls
    pub fn run_as_system(&self) {
        self.set_current_user(UserName::system());
    }

    /// Current deterministic time without advancing it
    pub fn now(&self) -> DateTime<Utc> {
        self.state.lock().now
    }
}

impl Default for MockEffects {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecurityEffects for MockEffects {
    async fn current_user(&self) -> Result<UserName> {
        Ok(self.state.lock().current_user.clone())
    }
}

#[async_trait]
impl PhysicalTimeEffects for MockEffects {
    async fn physical_time(&self) -> Result<DateTime<Utc>> {
        Ok(self.state.lock().tick())
    }
}
