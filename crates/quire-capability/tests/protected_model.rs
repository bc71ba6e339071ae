//! Protected aspects and properties, read filtering and entry votes

mod common;

use assert_matches::assert_matches;
use common::FilePlanFixture;
use quire_capability::{CapabilityError, EntryRequirement, Vote};
use quire_core::effects::NodeProperties;
use quire_core::AccessStatus;
use serde_json::{json, Value};

fn props(values: &[(&str, Value)]) -> NodeProperties {
    values
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn protected_names_follow_executable_actions() {
    let fixture = FilePlanFixture::new().await;
    let service = &fixture.service;
    let record = &fixture.record;

    fixture.act_as("rita", "RecordsManager").await;
    assert!(!service.is_protected_aspect(record, "rma:frozen").await.unwrap());
    assert!(!service.is_protected_aspect(record, "cm:titled").await.unwrap());
    assert!(!service.is_protected_property(record, "cm:title").await.unwrap());

    // nothing scheduled, so no one may move the disposition date
    assert!(service.is_protected_property(record, "rma:dispositionAsOf").await.unwrap());
    fixture.effects.update_node(record, |state| state.scheduled = true);
    assert!(!service.is_protected_property(record, "rma:dispositionAsOf").await.unwrap());

    // unfreeze and hold reasons take over once frozen
    fixture.effects.set_frozen(record, true);
    assert!(!service.is_protected_aspect(record, "rma:frozen").await.unwrap());
    assert!(!service.is_protected_property(record, "rma:holdReason").await.unwrap());
    assert!(service.is_protected_property(record, "rma:dispositionAsOf").await.unwrap());

    fixture.act_as("uma", "User").await;
    assert!(service.is_protected_aspect(record, "rma:frozen").await.unwrap());
}

#[tokio::test]
async fn protected_property_changes_deny_updates() {
    let fixture = FilePlanFixture::new().await;
    let service = &fixture.service;
    let record = &fixture.record;
    fixture
        .effects
        .set_property(record, "rma:dispositionAsOf", "2026-01-01");

    let same = props(&[("rma:dispositionAsOf", json!("2026-01-01"))]);
    let moved = props(&[("rma:dispositionAsOf", json!("2027-01-01"))]);
    let title = props(&[("cm:title", json!("Minutes"))]);
    let cleared = props(&[("rma:reviewAsOf", Value::Null)]);

    fixture.act_as("rita", "RecordsManager").await;
    assert!(!service.includes_protected_property_change(record, &same).await.unwrap());
    assert!(service.includes_protected_property_change(record, &moved).await.unwrap());
    assert!(!service.includes_protected_property_change(record, &title).await.unwrap());
    assert!(!service.includes_protected_property_change(record, &cleared).await.unwrap());

    assert_eq!(
        service.evaluate_update(record, None, Some(&title)).await.unwrap(),
        AccessStatus::Allowed
    );
    assert_eq!(
        service.evaluate_update(record, None, Some(&moved)).await.unwrap(),
        AccessStatus::Denied
    );
    assert_eq!(
        service.evaluate_update(record, Some("rma:frozen"), None).await.unwrap(),
        AccessStatus::Allowed
    );
    assert_eq!(
        service
            .evaluate_update(record, Some("rma:dispositionLifecycle"), None)
            .await
            .unwrap(),
        AccessStatus::Denied
    );
    assert_eq!(
        service.evaluate_update_properties(record, &title).await.unwrap(),
        AccessStatus::Allowed
    );
    assert_eq!(
        service.evaluate_update_properties(record, &moved).await.unwrap(),
        AccessStatus::Denied
    );

    fixture.effects.update_node(record, |state| state.scheduled = true);
    assert_eq!(
        service.evaluate_update_properties(record, &moved).await.unwrap(),
        AccessStatus::Allowed
    );

    fixture.act_as("uma", "User").await;
    assert_eq!(
        service.evaluate_update(record, None, Some(&title)).await.unwrap(),
        AccessStatus::Denied
    );
}

#[tokio::test]
async fn filter_readable_keeps_viewable_nodes() {
    let fixture = FilePlanFixture::new().await;
    let service = &fixture.service;
    let scratch = fixture.effects.create_plain_node("scratch");
    let nodes = vec![fixture.record.clone(), scratch.clone(), fixture.folder.clone()];

    fixture.act_as("uma", "User").await;
    assert_eq!(service.filter_readable(nodes.clone()).await.unwrap(), nodes);
    service.require_readable(&fixture.record).await.unwrap();

    fixture.act_as_outsider("eve");
    assert_eq!(service.filter_readable(nodes.clone()).await.unwrap(), vec![scratch.clone()]);
    assert_matches!(
        service.require_readable(&fixture.record).await,
        Err(CapabilityError::AccessDenied { node }) if node == fixture.record.to_string()
    );
    service.require_readable(&scratch).await.unwrap();
    assert!(service.filter_readable(Vec::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn explicit_requirements_decide_in_order() {
    let fixture = FilePlanFixture::new().await;
    let service = &fixture.service;
    fixture.act_as_outsider("eve");

    assert_eq!(service.vote(&[]).await.unwrap(), Vote::Abstain);
    assert_eq!(
        service
            .vote(&[EntryRequirement::Deny, EntryRequirement::Allow])
            .await
            .unwrap(),
        Vote::Denied
    );
    assert_eq!(
        service
            .vote(&[EntryRequirement::Allow, EntryRequirement::Deny])
            .await
            .unwrap(),
        Vote::Granted
    );
    assert_eq!(service.vote(&[EntryRequirement::Abstain]).await.unwrap(), Vote::Abstain);
    // queries pass on entry, their results get filtered
    assert_eq!(service.vote(&[EntryRequirement::Query]).await.unwrap(), Vote::Granted);

    let read = EntryRequirement::Read {
        node: fixture.record.clone(),
    };
    assert_eq!(service.vote(&[read.clone()]).await.unwrap(), Vote::Denied);
    fixture.effects.run_as_system();
    assert_eq!(service.vote(&[read, EntryRequirement::Deny]).await.unwrap(), Vote::Granted);
}

#[tokio::test]
async fn every_check_must_allow() {
    let fixture = FilePlanFixture::new().await;
    let service = &fixture.service;
    let record = &fixture.record;
    fixture.act_as("rita", "RecordsManager").await;

    let granted = [
        EntryRequirement::capability("ViewRecords", record.clone()),
        EntryRequirement::Read { node: record.clone() },
        EntryRequirement::Update {
            node: record.clone(),
            aspect: Some("rma:frozen".to_string()),
            properties: None,
        },
        EntryRequirement::UpdateProperties {
            node: record.clone(),
            properties: props(&[("cm:title", json!("Minutes"))]),
        },
        EntryRequirement::Delete {
            node: Some(record.clone()),
        },
    ];
    assert_eq!(service.vote(&granted).await.unwrap(), Vote::Granted);

    let denied = [
        EntryRequirement::capability("Teleport", record.clone()),
        EntryRequirement::Capability {
            name: "ViewRecords".to_string(),
            node: None,
        },
        EntryRequirement::Delete { node: None },
        // undetermined is not enough
        EntryRequirement::capability("MoveRecords", record.clone()),
        EntryRequirement::Update {
            node: record.clone(),
            aspect: Some("rma:dispositionLifecycle".to_string()),
            properties: None,
        },
    ];
    for requirement in denied {
        let requirements = [EntryRequirement::Read { node: record.clone() }, requirement];
        assert_eq!(
            service.vote(&requirements).await.unwrap(),
            Vote::Denied,
            "{:?}",
            requirements[1]
        );
    }

    fixture.act_as("uma", "User").await;
    assert_eq!(
        service
            .vote(&[EntryRequirement::Delete {
                node: Some(record.clone())
            }])
            .await
            .unwrap(),
        Vote::Denied
    );
}
