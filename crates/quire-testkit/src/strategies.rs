//! Property test strategies for Quire types

use proptest::prelude::*;

pub use proptest;

use quire_core::{FilePlanComponentKind, NodeRef, NodeState};

/// Strategy over the file plan component kinds
pub fn arb_kind() -> impl Strategy<Value = FilePlanComponentKind> {
    prop::sample::select(FilePlanComponentKind::ALL.to_vec())
}

/// Strategy over node states inside the given file plan
///
/// Every flag varies independently, including combinations a real repository
/// would never produce; capability laws must hold for all of them.
pub fn arb_node_state(file_plan: NodeRef) -> impl Strategy<Value = NodeState> {
    (arb_kind(), prop::collection::vec(any::<bool>(), 9)).prop_map(move |(kind, flags)| NodeState {
        kind: Some(kind),
        file_plan: Some(file_plan.clone()),
        frozen: flags[0],
        closed: flags[1],
        declared: flags[2],
        cut_off: flags[3],
        vital_record: flags[4],
        scheduled: flags[5],
        eligible_for_cutoff: flags[6],
        eligible_for_destruction: flags[7],
        transferring: flags[8],
    })
}

/// Strategy over opaque ticket-like strings
pub fn arb_ticket() -> impl Strategy<Value = String> {
    "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}"
}
