//! Shared fixture for capability integration tests

#![allow(dead_code)]

use quire_capability::CapabilityService;
use quire_core::{FilePlanComponentKind, NodeRef, UserName};
use quire_testkit::MockEffects;
use std::sync::Arc;

/// A bootstrapped file plan with one category, folder and record
pub struct FilePlanFixture {
    pub effects: Arc<MockEffects>,
    pub service: CapabilityService<MockEffects>,
    pub file_plan: NodeRef,
    pub category: NodeRef,
    pub folder: NodeRef,
    pub record: NodeRef,
}

impl FilePlanFixture {
    pub async fn new() -> Self {
        quire_testkit::init_tracing();
        let effects = Arc::new(MockEffects::new());
        let service = CapabilityService::reference(Arc::clone(&effects)).unwrap();

        let file_plan = effects.create_file_plan("fileplan");
        let category = effects.create_node(&file_plan, FilePlanComponentKind::RecordCategory, "category");
        let folder = effects.create_node(&category, FilePlanComponentKind::RecordFolder, "folder");
        let record = effects.create_node(&folder, FilePlanComponentKind::Record, "record");

        service
            .roles()
            .bootstrap_default_roles(&file_plan)
            .await
            .unwrap();

        Self {
            effects,
            service,
            file_plan,
            category,
            folder,
            record,
        }
    }

    /// Put a user into a role and act as them
    pub async fn act_as(&self, user: &str, role: &str) -> UserName {
        self.service
            .roles()
            .assign_role_to_authority(&self.file_plan, role, user)
            .await
            .unwrap();
        self.effects.set_current_user(user);
        UserName::new(user)
    }

    /// Act as a user without any role
    pub fn act_as_outsider(&self, user: &str) -> UserName {
        self.effects.set_current_user(user);
        UserName::new(user)
    }
}
