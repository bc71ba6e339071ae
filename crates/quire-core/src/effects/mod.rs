//! Core Effect Trait Definitions
//!
//! Pure trait definitions for every side effect the Quire engines perform.
//! This module defines **what** effects can be performed; handlers define **how**.
//!
//! # Effect Classification
//!
//! ## Repository Effects
//! - **FilePlan**: records-management state of nodes
//! - **Permission**: ACL entries and permission checks
//! - **Authority**: groups, zones and membership
//!
//! ## People Effects
//! - **Person**: person records
//! - **Authentication** / **Security**: accounts and the calling user
//!
//! ## Collaboration Effects
//! - **Site**: site lookup and membership
//! - **Workflow**: process definitions, tasks and transitions
//! - **Action**: outbound mail and asynchronous actions
//! - **PhysicalTime**: wall-clock time
//!
//! ## Composite Effects
//! Convenience supertraits combining the above (no handlers needed)
//!
//! All engine code is parameterized by these traits so tests can swap in the
//! in-memory handlers from `quire-testkit`.

pub mod action;
pub mod authority;
pub mod file_plan;
pub mod permission;
pub mod person;
pub mod security;
pub mod site;
pub mod supertraits;
pub mod time;
pub mod workflow;

pub use action::{ActionEffects, AsyncAction, MailMessage};
pub use authority::{AuthorityEffects, GROUP_PREFIX};
pub use file_plan::{FilePlanEffects, NodeProperties};
pub use permission::{AccessPermission, PermissionEffects, FILING_PERMISSION};
pub use person::{Person, PersonEffects};
pub use security::{AuthenticationEffects, SecurityEffects};
pub use site::{SiteEffects, SiteInfo, SITE_MANAGER_ROLE};
pub use supertraits::{CapabilityEffects, InvitationEffects};
pub use time::PhysicalTimeEffects;
pub use workflow::{
    TaskProperties, TaskState, WorkflowDefinition, WorkflowEffects, WorkflowInstance,
    WorkflowInstanceState, WorkflowPath, WorkflowTask, WorkflowTaskQuery,
};
