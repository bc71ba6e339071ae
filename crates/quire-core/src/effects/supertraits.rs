//! Composite effect traits
//!
//! Each engine is parameterized by one of these bundles. Blanket
//! implementations mean a handler only implements the individual traits.

use super::{
    ActionEffects, AuthenticationEffects, AuthorityEffects, FilePlanEffects, PermissionEffects,
    PersonEffects, PhysicalTimeEffects, SecurityEffects, SiteEffects, WorkflowEffects,
};

/// Effects required by the capability engine
pub trait CapabilityEffects:
    FilePlanEffects + PermissionEffects + AuthorityEffects + SecurityEffects + Send + Sync
{
}

impl<T> CapabilityEffects for T where
    T: FilePlanEffects + PermissionEffects + AuthorityEffects + SecurityEffects + Send + Sync
{
}

/// Effects required by the invitation engine
pub trait InvitationEffects:
    WorkflowEffects
    + PersonEffects
    + AuthenticationEffects
    + SecurityEffects
    + SiteEffects
    + ActionEffects
    + PhysicalTimeEffects
    + Send
    + Sync
{
}

impl<T> InvitationEffects for T where
    T: WorkflowEffects
        + PersonEffects
        + AuthenticationEffects
        + SecurityEffects
        + SiteEffects
        + ActionEffects
        + PhysicalTimeEffects
        + Send
        + Sync
{
}
