//! # Quire Invitation
//!
//! Site invitation workflows on top of a BPM engine.
//!
//! # Architecture
//!
//! - [`model`]: property keys, task types and transitions of the processes
//! - [`workflow`]: one [`InvitationWorkflow`] adapter per supported engine
//! - [`invitation`]: invitation values rebuilt from workflow tasks
//! - [`service`]: the [`InvitationService`] facade
//! - [`delegates`]: follow-up work of each transition
//! - [`cleanup`]: cancellation cascade for deleted sites and people
//!
//! Nominated invitations run `Pending -> Accepted | Rejected | Cancelled`;
//! moderated ones run `Submitted -> Review -> Approved | Rejected | Cancelled`.
//! Every terminal state is final: a second transition is a user error.

#![forbid(unsafe_code)]

pub mod cleanup;
pub mod config;
pub mod criteria;
pub mod delegates;
pub mod error;
pub mod generator;
pub mod id;
pub mod invitation;
pub mod model;
pub mod service;
pub mod workflow;

pub use cleanup::{CascadeGuard, CleanupAction, DeletedNode};
pub use config::InvitationConfig;
pub use criteria::{InvitationSearchCriteria, InvitationTypeFilter};
pub use error::{InvitationError, InvitationResult};
pub use generator::{NameBasedUserNameGenerator, PasswordGenerator, RandomPasswordGenerator, UserNameGenerator};
pub use id::InvitationId;
pub use invitation::{
    Invitation, InvitationStatus, InvitationType, ModeratedInvitation, NominatedInvitation,
    ResourceType,
};
pub use service::{InvitationService, ModeratedInviteRequest, NominatedInviteRequest};
pub use workflow::{
    ActivitiInvitationWorkflow, InvitationWorkflow, InvitationWorkflowType, JbpmInvitationWorkflow,
    WorkflowEngine,
};
