//! Work queue interface consumed by the search loop.
//!
//! [`Db`](crate::db::Db) implements it over a Postgres table. Each call is
//! its own write; nothing spans more than one row update.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::work::{Completion, WorkId, WorkItem};

#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Select one unclaimed item of `item_type`.
    ///
    /// With `start_sequence`, returns the lowest unclaimed sequence at or
    /// above it (numeric compare). Without, picks uniformly at random so
    /// concurrent bots spread across the table.
    async fn acquire(
        &self,
        item_type: &str,
        start_sequence: Option<&str>,
    ) -> Result<Option<WorkItem>>;

    /// Tag an item as being processed by `bot`. Unconditional write.
    async fn claim(&self, id: WorkId, bot: &str) -> Result<()>;

    /// Clear an item's claim so another bot can pick it up.
    async fn release(&self, id: WorkId) -> Result<()>;

    /// Write the final result fields and completion timestamp.
    async fn complete(&self, id: WorkId, completion: &Completion) -> Result<()>;
}
