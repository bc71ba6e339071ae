//! In-memory content repository: node state, ACLs and authorities

use crate::MockEffects;
use async_trait::async_trait;
use quire_core::effects::{
    AccessPermission, AuthorityEffects, FilePlanEffects, NodeProperties, PermissionEffects,
    GROUP_PREFIX,
};
use quire_core::{AccessStatus, FilePlanComponentKind, NodeRef, NodeState, QuireError, Result, UserName};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub(crate) struct RepositoryState {
    nodes: BTreeMap<NodeRef, NodeRecord>,
    groups: BTreeMap<String, GroupRecord>,
}

#[derive(Debug)]
struct NodeRecord {
    parent: Option<NodeRef>,
    /// Flags set on this node only; `frozen` and `closed` are derived on read
    own: NodeState,
    acl: Vec<AccessPermission>,
    properties: NodeProperties,
}

#[derive(Debug, Default)]
struct GroupRecord {
    display_name: String,
    zones: BTreeSet<String>,
    members: BTreeSet<String>,
}

impl RepositoryState {
    fn node(&self, node: &NodeRef) -> Result<&NodeRecord> {
        self.nodes
            .get(node)
            .ok_or_else(|| QuireError::not_found(format!("node {node}")))
    }

    /// The node followed by its ancestors
    fn lineage(&self, node: &NodeRef) -> Vec<&NodeRecord> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes.get(node);
        while let Some(record) = cursor {
            chain.push(record);
            cursor = record.parent.as_ref().and_then(|p| self.nodes.get(p));
        }
        chain
    }

    fn containing_groups(&self, authority: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut pending = vec![authority.to_string()];
        while let Some(current) = pending.pop() {
            for (name, group) in &self.groups {
                if group.members.contains(&current) && found.insert(name.clone()) {
                    pending.push(name.clone());
                }
            }
        }
        found
    }

    /// Users and groups nested under a group, at any depth
    fn contained(&self, group: &str) -> (BTreeSet<UserName>, BTreeSet<String>) {
        let mut users = BTreeSet::new();
        let mut groups = BTreeSet::new();
        let mut pending = vec![group.to_string()];
        while let Some(current) = pending.pop() {
            let Some(record) = self.groups.get(&current) else {
                continue;
            };
            for member in &record.members {
                if member.starts_with(GROUP_PREFIX) {
                    if member != group && groups.insert(member.clone()) {
                        pending.push(member.clone());
                    }
                } else {
                    users.insert(UserName::new(member.clone()));
                }
            }
        }
        (users, groups)
    }
}

impl MockEffects {
    /// Create a file plan root
    pub fn create_file_plan(&self, id: &str) -> NodeRef {
        let node = NodeRef::workspace(id);
        let own = NodeState::in_file_plan(FilePlanComponentKind::FilePlan, node.clone());
        self.insert_node(node.clone(), None, own);
        node
    }

    /// Create a file plan component under a parent
    pub fn create_node(&self, parent: &NodeRef, kind: FilePlanComponentKind, id: &str) -> NodeRef {
        let node = NodeRef::workspace(id);
        let file_plan = self
            .state
            .lock()
            .repository
            .nodes
            .get(parent)
            .and_then(|p| p.own.file_plan.clone());
        let own = NodeState {
            kind: file_plan.as_ref().map(|_| kind),
            file_plan,
            ..NodeState::default()
        };
        self.insert_node(node.clone(), Some(parent.clone()), own);
        node
    }

    /// Create a node outside any file plan
    pub fn create_plain_node(&self, id: &str) -> NodeRef {
        let node = NodeRef::workspace(id);
        self.insert_node(node.clone(), None, NodeState::default());
        node
    }

    fn insert_node(&self, node: NodeRef, parent: Option<NodeRef>, own: NodeState) {
        self.state.lock().repository.nodes.insert(
            node,
            NodeRecord {
                parent,
                own,
                acl: Vec::new(),
                properties: NodeProperties::new(),
            },
        );
    }

    /// Mutate the flags set directly on a node
    pub fn update_node(&self, node: &NodeRef, update: impl FnOnce(&mut NodeState)) {
        let mut state = self.state.lock();
        let record = state
            .repository
            .nodes
            .get_mut(node)
            .unwrap_or_else(|| panic!("unknown node {node}"));
        update(&mut record.own);
    }

    /// Store a property value on a node
    pub fn set_property(&self, node: &NodeRef, name: &str, value: impl Into<serde_json::Value>) {
        let mut state = self.state.lock();
        let record = state
            .repository
            .nodes
            .get_mut(node)
            .unwrap_or_else(|| panic!("unknown node {node}"));
        record.properties.insert(name.to_string(), value.into());
    }

    /// Freeze or unfreeze a node
    pub fn set_frozen(&self, node: &NodeRef, frozen: bool) {
        self.update_node(node, |state| state.frozen = frozen);
    }

    /// Put a user or group directly into a group, creating it if needed
    pub fn add_to_group(&self, group: &str, member: &str) {
        let mut state = self.state.lock();
        state
            .repository
            .groups
            .entry(group.to_string())
            .or_default()
            .members
            .insert(member.to_string());
    }
}

#[async_trait]
impl FilePlanEffects for MockEffects {
    async fn node_state(&self, node: &NodeRef) -> Result<NodeState> {
        let state = self.state.lock();
        let repository = &state.repository;
        let record = repository.node(node)?;
        let lineage = repository.lineage(node);

        let mut snapshot = record.own.clone();
        snapshot.frozen = lineage.iter().any(|r| r.own.frozen);
        snapshot.closed = record.own.closed
            || (snapshot.is_record()
                && lineage
                    .iter()
                    .skip(1)
                    .any(|r| r.own.kind == Some(FilePlanComponentKind::RecordFolder) && r.own.closed));
        Ok(snapshot)
    }

    async fn node_properties(&self, node: &NodeRef) -> Result<NodeProperties> {
        Ok(self.state.lock().repository.node(node)?.properties.clone())
    }
}

#[async_trait]
impl PermissionEffects for MockEffects {
    async fn has_permission(
        &self,
        node: &NodeRef,
        user: &UserName,
        permission: &str,
    ) -> Result<AccessStatus> {
        let state = self.state.lock();
        let repository = &state.repository;
        repository.node(node)?;

        let mut authorities = repository.containing_groups(user.as_str());
        authorities.insert(user.as_str().to_string());

        for record in repository.lineage(node) {
            let applicable: Vec<&AccessPermission> = record
                .acl
                .iter()
                .filter(|entry| entry.permission == permission && authorities.contains(&entry.authority))
                .collect();
            if applicable.iter().any(|entry| !entry.allowed) {
                return Ok(AccessStatus::Denied);
            }
            if !applicable.is_empty() {
                return Ok(AccessStatus::Allowed);
            }
        }
        Ok(AccessStatus::Undetermined)
    }

    async fn set_permission(
        &self,
        node: &NodeRef,
        authority: &str,
        permission: &str,
        allow: bool,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let record = state
            .repository
            .nodes
            .get_mut(node)
            .ok_or_else(|| QuireError::not_found(format!("node {node}")))?;
        record
            .acl
            .retain(|entry| !(entry.authority == authority && entry.permission == permission));
        record.acl.push(AccessPermission {
            authority: authority.to_string(),
            permission: permission.to_string(),
            allowed: allow,
        });
        Ok(())
    }

    async fn delete_permission(&self, node: &NodeRef, authority: &str, permission: &str) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(record) = state.repository.nodes.get_mut(node) {
            record
                .acl
                .retain(|entry| !(entry.authority == authority && entry.permission == permission));
        }
        Ok(())
    }

    async fn all_set_permissions(&self, node: &NodeRef) -> Result<Vec<AccessPermission>> {
        Ok(self.state.lock().repository.node(node)?.acl.clone())
    }
}

#[async_trait]
impl AuthorityEffects for MockEffects {
    async fn authorities_in_zone(&self, zone: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .state
            .lock()
            .repository
            .groups
            .iter()
            .filter(|(_, group)| group.zones.contains(zone))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn authority_exists(&self, name: &str) -> Result<bool> {
        let state = self.state.lock();
        Ok(state.repository.groups.contains_key(name)
            || state.people.persons.contains_key(&UserName::new(name)))
    }

    async fn create_group(&self, short_name: &str, display_name: &str, zones: &[String]) -> Result<String> {
        let name = format!("{GROUP_PREFIX}{short_name}");
        let mut state = self.state.lock();
        if state.repository.groups.contains_key(&name) {
            return Err(QuireError::invalid(format!("group {name} already exists")));
        }
        state.repository.groups.insert(
            name.clone(),
            GroupRecord {
                display_name: display_name.to_string(),
                zones: zones.iter().cloned().collect(),
                members: BTreeSet::new(),
            },
        );
        Ok(name)
    }

    async fn delete_group(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        state
            .repository
            .groups
            .remove(name)
            .ok_or_else(|| QuireError::not_found(format!("group {name}")))?;
        for group in state.repository.groups.values_mut() {
            group.members.remove(name);
        }
        Ok(())
    }

    async fn display_name(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .repository
            .groups
            .get(name)
            .map(|group| group.display_name.clone()))
    }

    async fn set_display_name(&self, name: &str, display_name: &str) -> Result<()> {
        let mut state = self.state.lock();
        let group = state
            .repository
            .groups
            .get_mut(name)
            .ok_or_else(|| QuireError::not_found(format!("group {name}")))?;
        group.display_name = display_name.to_string();
        Ok(())
    }

    async fn add_authority(&self, parent: &str, child: &str) -> Result<()> {
        let mut state = self.state.lock();
        let group = state
            .repository
            .groups
            .get_mut(parent)
            .ok_or_else(|| QuireError::not_found(format!("group {parent}")))?;
        group.members.insert(child.to_string());
        Ok(())
    }

    async fn remove_authority(&self, parent: &str, child: &str) -> Result<()> {
        if let Some(group) = self.state.lock().repository.groups.get_mut(parent) {
            group.members.remove(child);
        }
        Ok(())
    }

    async fn contained_users(&self, group: &str) -> Result<BTreeSet<UserName>> {
        Ok(self.state.lock().repository.contained(group).0)
    }

    async fn contained_groups(&self, group: &str) -> Result<BTreeSet<String>> {
        Ok(self.state.lock().repository.contained(group).1)
    }

    async fn containing_groups(&self, authority: &str) -> Result<BTreeSet<String>> {
        Ok(self.state.lock().repository.containing_groups(authority))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frozen_and_closed_are_inherited() {
        let effects = MockEffects::new();
        let file_plan = effects.create_file_plan("fp");
        let category = effects.create_node(&file_plan, FilePlanComponentKind::RecordCategory, "cat");
        let folder = effects.create_node(&category, FilePlanComponentKind::RecordFolder, "folder");
        let record = effects.create_node(&folder, FilePlanComponentKind::Record, "record");

        effects.update_node(&folder, |s| {
            s.frozen = true;
            s.closed = true;
        });
        let state = effects.node_state(&record).await.unwrap();
        assert!(state.frozen && state.closed);
        assert_eq!(state.file_plan, Some(file_plan));

        let state = effects.node_state(&category).await.unwrap();
        assert!(!state.frozen && !state.closed);
    }

    #[tokio::test]
    async fn test_permissions_inherit_through_groups() {
        let effects = MockEffects::new();
        let file_plan = effects.create_file_plan("fp");
        let folder = effects.create_node(&file_plan, FilePlanComponentKind::RecordFolder, "f");
        let group = effects
            .create_group("Readers", "Readers", &[])
            .await
            .unwrap();
        effects.add_authority(&group, "alice").await.unwrap();
        effects
            .set_permission(&file_plan, &group, "Read", true)
            .await
            .unwrap();

        let alice = UserName::new("alice");
        let bob = UserName::new("bob");
        assert_eq!(
            effects.has_permission(&folder, &alice, "Read").await.unwrap(),
            AccessStatus::Allowed
        );
        assert_eq!(
            effects.has_permission(&folder, &bob, "Read").await.unwrap(),
            AccessStatus::Undetermined
        );

        effects.set_permission(&folder, "alice", "Read", false).await.unwrap();
        assert_eq!(
            effects.has_permission(&folder, &alice, "Read").await.unwrap(),
            AccessStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_properties_are_per_node() {
        let effects = MockEffects::new();
        let file_plan = effects.create_file_plan("fp");
        let record = effects.create_node(&file_plan, FilePlanComponentKind::Record, "r");
        effects.set_property(&record, "rma:holdReason", "audit");

        let stored = effects.node_properties(&record).await.unwrap();
        assert_eq!(stored.get("rma:holdReason"), Some(&serde_json::Value::from("audit")));
        assert!(effects.node_properties(&file_plan).await.unwrap().is_empty());
        assert!(effects.node_properties(&NodeRef::workspace("gone")).await.is_err());
    }

    #[tokio::test]
    async fn test_nested_group_users() {
        let effects = MockEffects::new();
        let outer = effects.create_group("outer", "Outer", &[]).await.unwrap();
        let inner = effects.create_group("inner", "Inner", &[]).await.unwrap();
        effects.add_authority(&outer, &inner).await.unwrap();
        effects.add_authority(&inner, "carol").await.unwrap();

        let users = effects.contained_users(&outer).await.unwrap();
        assert!(users.contains(&UserName::new("carol")));
        let groups = effects.containing_groups("carol").await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(
            effects.contained_groups(&outer).await.unwrap(),
            BTreeSet::from([inner.clone()])
        );
        assert!(effects.contained_groups(&inner).await.unwrap().is_empty());
    }
}
