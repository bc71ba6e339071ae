//! File plan component kinds and node state
//!
//! `NodeState` is the snapshot of node facts that capability conditions read.
//! It is produced by `FilePlanEffects::node_state` and never mutated by the
//! engines.

use crate::identifiers::NodeRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a node inside a file plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilePlanComponentKind {
    /// The root of a file plan
    FilePlan,
    /// A category grouping folders
    RecordCategory,
    /// A folder holding records
    RecordFolder,
    /// A record
    Record,
}

impl FilePlanComponentKind {
    /// All kinds, in containment order
    pub const ALL: [FilePlanComponentKind; 4] = [
        Self::FilePlan,
        Self::RecordCategory,
        Self::RecordFolder,
        Self::Record,
    ];

    /// Canonical name used in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FilePlan => "FilePlan",
            Self::RecordCategory => "RecordCategory",
            Self::RecordFolder => "RecordFolder",
            Self::Record => "Record",
        }
    }
}

impl fmt::Display for FilePlanComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilePlanComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown file plan component kind '{s}'"))
    }
}

/// Records-management facts about a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// Kind within the file plan, `None` when the node is outside any file plan
    pub kind: Option<FilePlanComponentKind>,
    /// Root of the file plan containing the node
    pub file_plan: Option<NodeRef>,
    /// Node (or an ancestor) is held by a freeze
    pub frozen: bool,
    /// Folder is closed, or the record's folder is closed
    pub closed: bool,
    /// Record has been declared
    pub declared: bool,
    /// Node has been cut off
    pub cut_off: bool,
    /// Record is flagged as vital
    pub vital_record: bool,
    /// Node is under a disposition schedule
    pub scheduled: bool,
    /// Next disposition step is a cut off that is due
    pub eligible_for_cutoff: bool,
    /// Next disposition step is a destroy that is due
    pub eligible_for_destruction: bool,
    /// Node is part of an in-flight transfer or accession
    pub transferring: bool,
}

impl NodeState {
    /// State for a node of the given kind inside a file plan
    pub fn in_file_plan(kind: FilePlanComponentKind, file_plan: NodeRef) -> Self {
        Self {
            kind: Some(kind),
            file_plan: Some(file_plan),
            ..Self::default()
        }
    }

    /// Whether the node is a record
    pub fn is_record(&self) -> bool {
        self.kind == Some(FilePlanComponentKind::Record)
    }
}
