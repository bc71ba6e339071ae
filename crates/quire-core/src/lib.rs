//! Quire Core - Records Management Foundation
//!
//! This crate provides the shared vocabulary for the Quire engines: node and
//! user identifiers, file plan component kinds, the tri-state access verdict,
//! configuration validation, and the effect traits through which the engines
//! reach their external collaborators.
//!
//! # Architecture Layers
//!
//! ## Core Types
//! - `NodeRef`, `UserName`: opaque identifiers for repository nodes and users
//! - `FilePlanComponentKind`, `NodeState`: the records-management view of a node
//! - `AccessStatus`: `Allowed` / `Denied` / `Undetermined`
//!
//! ## Effect Interfaces (Pure Signatures)
//! - `FilePlanEffects`, `PermissionEffects`, `AuthorityEffects`: node facts and ACLs
//! - `WorkflowEffects`: process definitions, tasks and transitions
//! - `PersonEffects`, `AuthenticationEffects`, `SecurityEffects`: people and accounts
//! - `SiteEffects`, `ActionEffects`: site membership, mail and async actions
//!
//! Engines are parameterized by these traits; `quire-testkit` supplies
//! in-memory handlers.

#![forbid(unsafe_code)]

/// Configuration traits and validation
pub mod config;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Node and user identifiers
pub mod identifiers;

/// File plan component kinds and node state
pub mod file_plan;

/// Tri-state access verdicts
pub mod access;

pub use access::AccessStatus;
pub use errors::{QuireError, Result};
pub use file_plan::{FilePlanComponentKind, NodeState};
pub use identifiers::{NodeRef, UserName};
