//! # Quire Capability
//!
//! Records-management capability engine. Decides, per node and user, whether
//! a named capability is `Allowed`, `Denied` or `Undetermined`.
//!
//! # Architecture
//!
//! - [`condition`]: named predicates in an immutable [`ConditionTable`]
//! - [`capability`]: declarative and composite capabilities with pure gating
//! - [`config`] / [`registry`]: the TOML model and the read-only registry built from it
//! - [`role`]: roles as authority groups in a per-file-plan zone
//! - [`service`]: context gathering, permission-model fallback and batch queries
//! - [`protection`]: aspects and properties owned by records-management actions
//! - [`voter`]: entry votes over capability, read, update and delete requirements
//!
//! A declarative capability checks, in order: the user holds some role on the
//! owning file plan (the system user skips this), the node kind is listed,
//! every condition produces its configured outcome, and a held role grants the
//! capability. Permission-backed capabilities then ask the permission model
//! for their underlying permission; some of them skip the grant check.

#![forbid(unsafe_code)]

pub mod capability;
pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod protection;
pub mod registry;
pub mod role;
pub mod service;
pub mod voter;

pub use capability::{combine_composite, Capability, CapabilityDefinition, DeclarativeCapability, Gate};
pub use condition::{CapabilityCondition, ConditionTable, FnCondition};
pub use config::{CapabilityConfig, CapabilityEntry, CompositeEntry, ProtectedEntry, RoleEntry};
pub use context::EvaluationContext;
pub use error::{CapabilityError, CapabilityResult};
pub use protection::ProtectionRegistry;
pub use registry::CapabilityRegistry;
pub use role::{role_authority, role_zone, FilePlanRoleService, Role, ADMINISTRATOR_ROLE};
pub use service::{CapabilityService, UPDATE, UPDATE_PROPERTIES, VIEW_RECORDS};
pub use voter::{EntryRequirement, Vote, DELETE};
