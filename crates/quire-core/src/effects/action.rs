//! Action effects: outbound mail and asynchronous actions

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A templated mail message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Recipients (addresses or authority names)
    pub to: Vec<String>,
    /// Sender address, `None` for the system default
    pub from: Option<String>,
    /// Subject line or message key
    pub subject: String,
    /// Template identifier
    pub template: String,
    /// Template model
    pub model: BTreeMap<String, String>,
}

/// Action queued for asynchronous execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsyncAction {
    /// Cancel the given workflow instances
    CancelWorkflows {
        /// Workflow instance ids
        workflow_ids: Vec<String>,
    },
}

/// Effect trait for side actions
#[async_trait]
pub trait ActionEffects: Send + Sync {
    /// Send a mail message
    async fn send_mail(&self, message: MailMessage) -> Result<()>;

    /// Queue an action to run after the current operation
    async fn execute_async(&self, action: AsyncAction) -> Result<()>;
}
