//! Quire Testing Infrastructure
//!
//! In-memory handlers for every `quire-core` effect trait, plus proptest
//! strategies and logging setup shared by the engine crates' tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! quire-testkit = { path = "../quire-testkit" }
//! ```
//!
//! ```rust,no_run
//! use quire_testkit::MockEffects;
//! use quire_core::FilePlanComponentKind;
//!
//! let effects = MockEffects::new();
//! let file_plan = effects.create_file_plan("fp");
//! let category = effects.create_node(&file_plan, FilePlanComponentKind::RecordCategory, "cat");
//! ```

pub mod mock_effects;
pub mod people;
pub mod repository;
pub mod sites;
pub mod strategies;
pub mod workflow;

pub use mock_effects::MockEffects;
pub use people::Account;
pub use sites::MembershipGrant;
pub use workflow::{ProcessDefinition, TaskNode};

/// Install a `tracing` subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
