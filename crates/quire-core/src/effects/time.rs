//! Time effects

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Effect trait for wall-clock time
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current time
    async fn physical_time(&self) -> Result<DateTime<Utc>>;
}
