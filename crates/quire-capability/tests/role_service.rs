//! File plan role management

mod common;

use assert_matches::assert_matches;
use common::FilePlanFixture;
use quire_capability::{role_authority, CapabilityError, ADMINISTRATOR_ROLE};
use quire_core::{AccessStatus, UserName};
use std::collections::BTreeSet;

fn names(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn bootstrap_creates_default_roles() {
    let fixture = FilePlanFixture::new().await;
    let roles = fixture.service.roles();

    let all = roles.get_roles(&fixture.file_plan, true).await.unwrap();
    assert_eq!(all.len(), 5);

    let visible: BTreeSet<String> = roles
        .get_roles(&fixture.file_plan, false)
        .await
        .unwrap()
        .into_iter()
        .map(|role| role.name)
        .collect();
    assert_eq!(
        visible,
        names(&["PowerUser", "RecordsManager", "SecurityOfficer", "User"])
    );

    let admin = roles
        .get_role(&fixture.file_plan, ADMINISTRATOR_ROLE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.capabilities.len(), 59);
    assert_eq!(admin.role_group_name, role_authority(&fixture.file_plan, ADMINISTRATOR_ROLE));

    let user = roles.get_role(&fixture.file_plan, "User").await.unwrap().unwrap();
    assert_eq!(user.capabilities, names(&["DeclareRecords", "FileRecords", "ViewRecords"]));
    assert_eq!(user.display_label, "Records Management User");
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let fixture = FilePlanFixture::new().await;
    let roles = fixture.service.roles();
    roles.bootstrap_default_roles(&fixture.file_plan).await.unwrap();
    assert_eq!(roles.get_roles(&fixture.file_plan, true).await.unwrap().len(), 5);
}

#[tokio::test]
async fn role_lifecycle() {
    let fixture = FilePlanFixture::new().await;
    let roles = fixture.service.roles();
    let fp = &fixture.file_plan;

    let created = roles
        .create_role(fp, "Auditor", "Auditor", &names(&["AccessAudit", "ViewRecords"]))
        .await
        .unwrap();
    assert!(roles.exists_role(fp, "Auditor").await.unwrap());
    assert_eq!(created.capabilities.len(), 2);

    assert_matches!(
        roles.create_role(fp, "Auditor", "Again", &BTreeSet::new()).await,
        Err(CapabilityError::RoleExists { .. })
    );

    let updated = roles
        .update_role(fp, "Auditor", "Chief Auditor", &names(&["ExportAudit"]))
        .await
        .unwrap();
    assert_eq!(updated.display_label, "Chief Auditor");
    let stored = roles.get_role(fp, "Auditor").await.unwrap().unwrap();
    assert_eq!(stored.capabilities, names(&["ExportAudit"]));
    assert_eq!(stored.display_label, "Chief Auditor");

    roles.delete_role(fp, "Auditor").await.unwrap();
    assert!(!roles.exists_role(fp, "Auditor").await.unwrap());
    assert_matches!(
        roles.delete_role(fp, "Auditor").await,
        Err(CapabilityError::UnknownRole { .. })
    );
}

#[tokio::test]
async fn unknown_capabilities_are_rejected() {
    let fixture = FilePlanFixture::new().await;
    assert_matches!(
        fixture
            .service
            .roles()
            .create_role(&fixture.file_plan, "Odd", "Odd", &names(&["Teleport"]))
            .await,
        Err(CapabilityError::UnknownCapability(name)) if name == "Teleport"
    );
}

#[tokio::test]
async fn user_roles_and_assignments() {
    let fixture = FilePlanFixture::new().await;
    let roles = fixture.service.roles();
    let fp = &fixture.file_plan;

    roles.assign_role_to_authority(fp, "User", "alice").await.unwrap();
    roles.assign_role_to_authority(fp, ADMINISTRATOR_ROLE, "bob").await.unwrap();

    // nested group membership counts
    fixture.effects.add_to_group("GROUP_clerks", "carol");
    roles.assign_role_to_authority(fp, "PowerUser", "GROUP_clerks").await.unwrap();

    let alice = UserName::new("alice");
    let held: Vec<String> = roles
        .get_roles_by_user(fp, &alice, true)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(held, vec!["User".to_string()]);

    assert!(roles.has_admin_role(fp, &UserName::new("bob")).await.unwrap());
    assert!(!roles.has_admin_role(fp, &alice).await.unwrap());
    assert!(roles
        .get_roles_by_user(fp, &UserName::new("bob"), false)
        .await
        .unwrap()
        .is_empty());

    let power_users = roles.users_assigned_to_role(fp, "PowerUser").await.unwrap();
    assert!(power_users.contains(&UserName::new("carol")));

    assert_matches!(
        roles.assign_role_to_authority(fp, "Janitor", "alice").await,
        Err(CapabilityError::UnknownRole { .. })
    );
}

#[tokio::test]
async fn role_grants_drive_evaluation() {
    let fixture = FilePlanFixture::new().await;
    let roles = fixture.service.roles();
    let fp = &fixture.file_plan;

    roles
        .create_role(fp, "Viewer", "Viewer", &names(&["ViewRecords"]))
        .await
        .unwrap();
    fixture.act_as("vic", "Viewer").await;
    assert_eq!(
        fixture.service.has_permission(&fixture.record, "ViewRecords").await.unwrap(),
        AccessStatus::Allowed
    );
    assert_eq!(
        fixture.service.has_permission(&fixture.record, "AccessAudit").await.unwrap(),
        AccessStatus::Denied
    );

    roles
        .update_role(fp, "Viewer", "Viewer", &names(&["AccessAudit"]))
        .await
        .unwrap();
    assert_eq!(
        fixture.service.has_permission(&fixture.record, "ViewRecords").await.unwrap(),
        AccessStatus::Denied
    );
    assert_eq!(
        fixture.service.has_permission(&fixture.record, "AccessAudit").await.unwrap(),
        AccessStatus::Allowed
    );
}

#[tokio::test]
async fn assigned_authorities_and_unassignment() {
    let fixture = FilePlanFixture::new().await;
    let roles = fixture.service.roles();
    let fp = &fixture.file_plan;

    fixture.effects.add_to_group("GROUP_clerks", "carol");
    fixture.effects.add_to_group("GROUP_clerks", "GROUP_interns");
    fixture.effects.add_to_group("GROUP_interns", "ivan");
    roles.assign_role_to_authority(fp, "PowerUser", "dan").await.unwrap();
    roles.assign_role_to_authority(fp, "PowerUser", "GROUP_clerks").await.unwrap();
    // assigning twice is a no-op
    roles.assign_role_to_authority(fp, "PowerUser", "dan").await.unwrap();

    assert_eq!(
        roles.groups_assigned_to_role(fp, "PowerUser").await.unwrap(),
        names(&["GROUP_clerks", "GROUP_interns"])
    );
    assert_eq!(
        roles.all_assigned_to_role(fp, "PowerUser").await.unwrap(),
        names(&["GROUP_clerks", "GROUP_interns", "carol", "dan", "ivan"])
    );
    assert!(roles.groups_assigned_to_role(fp, "User").await.unwrap().is_empty());

    roles.unassign_role_from_authority(fp, "PowerUser", "dan").await.unwrap();
    let users = roles.users_assigned_to_role(fp, "PowerUser").await.unwrap();
    assert!(!users.contains(&UserName::new("dan")));
    assert!(users.contains(&UserName::new("ivan")));

    // ivan only holds the role through a group
    roles.unassign_role_from_authority(fp, "PowerUser", "ivan").await.unwrap();
    assert!(roles
        .users_assigned_to_role(fp, "PowerUser")
        .await
        .unwrap()
        .contains(&UserName::new("ivan")));

    roles
        .unassign_role_from_authority(fp, "PowerUser", "GROUP_clerks")
        .await
        .unwrap();
    assert!(roles.all_assigned_to_role(fp, "PowerUser").await.unwrap().is_empty());

    fixture.act_as_outsider("dan");
    assert_eq!(
        fixture.service.has_permission(&fixture.record, "ViewRecords").await.unwrap(),
        AccessStatus::Denied
    );

    assert_matches!(
        roles.unassign_role_from_authority(fp, "Janitor", "dan").await,
        Err(CapabilityError::UnknownRole { .. })
    );
    assert_matches!(
        roles.all_assigned_to_role(fp, "Janitor").await,
        Err(CapabilityError::UnknownRole { .. })
    );
}
