//! Work queue operations: acquire, claim, release, complete, plus the
//! operator helpers for seeding and recovering stale claims.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;

use crate::error::{Error, Result};
use crate::model::work::{ClaimState, Completion, WorkId, WorkItem};
use crate::queue::WorkQueue;
use crate::telemetry::metrics;

/// Row predicate for items no bot has touched.
const UNCLAIMED: &str = "vin IS NULL AND checked_on IS NULL AND bot IS NULL";

const COLUMNS: &str = "id, sequence, type AS item_type, vin, carfax_records, autocheck_records, \
                       name, bot, checked_on";

/// Per-type row counts, for `work stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub unclaimed: i64,
    pub claimed: i64,
    pub completed: i64,
    pub found: i64,
}

fn record_op(operation: &'static str) {
    metrics::queue_operations().add(1, &[KeyValue::new("operation", operation)]);
}

impl super::Db {
    /// Pick one unclaimed item. See [`WorkQueue::acquire`].
    pub async fn acquire_work(
        &self,
        item_type: &str,
        start_sequence: Option<&str>,
    ) -> Result<Option<WorkItem>> {
        let table = self.table();
        let row: Option<WorkItemRow> = match start_sequence {
            Some(start) => {
                let start: i64 = start.parse().map_err(|_| {
                    Error::Config(format!("start sequence is not a number: {start}"))
                })?;
                sqlx::query_as(&format!(
                    "SELECT {COLUMNS} FROM {table}
                     WHERE {UNCLAIMED} AND type = $1 AND CAST(sequence AS BIGINT) >= $2
                     ORDER BY CAST(sequence AS BIGINT)
                     LIMIT 1"
                ))
                .bind(item_type)
                .bind(start)
                .fetch_optional(self.pool())
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {COLUMNS} FROM {table}
                     WHERE {UNCLAIMED} AND type = $1
                     ORDER BY random()
                     LIMIT 1"
                ))
                .bind(item_type)
                .fetch_optional(self.pool())
                .await?
            }
        };

        record_op(if row.is_some() { "acquire" } else { "acquire_empty" });
        Ok(row.map(WorkItemRow::into_work_item))
    }

    /// Set or clear the claiming bot on one row.
    pub async fn tag_work(&self, id: WorkId, bot: Option<&str>) -> Result<()> {
        let rows_affected = sqlx::query(&format!(
            "UPDATE {} SET bot = $1 WHERE id = $2",
            self.table()
        ))
        .bind(bot)
        .bind(id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("work item {id}")));
        }
        record_op(if bot.is_some() { "claim" } else { "release" });
        Ok(())
    }

    /// Write the result fields and stamp `checked_on`.
    pub async fn complete_work(&self, id: WorkId, completion: &Completion) -> Result<()> {
        let rows_affected = sqlx::query(&format!(
            "UPDATE {} SET vin = $1, carfax_records = $2, autocheck_records = $3, name = $4,
                 bot = $5, checked_on = now()
             WHERE id = $6",
            self.table()
        ))
        .bind(&completion.vin)
        .bind(completion.carfax_records)
        .bind(completion.autocheck_records)
        .bind(&completion.name)
        .bind(&completion.bot)
        .bind(id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("work item {id}")));
        }
        record_op("complete");
        Ok(())
    }

    /// Get a work item by ID.
    pub async fn get_work_item(&self, id: WorkId) -> Result<WorkItem> {
        let row: Option<WorkItemRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM {} WHERE id = $1",
            self.table()
        ))
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;

        row.map(WorkItemRow::into_work_item)
            .ok_or_else(|| Error::NotFound(format!("work item {id}")))
    }

    /// Insert unclaimed rows for `sequences`. Existing rows are left alone.
    /// Returns the number of rows inserted.
    pub async fn seed_work(&self, item_type: &str, sequences: &[String]) -> Result<u64> {
        let inserted = sqlx::query(&format!(
            "INSERT INTO {} (sequence, type)
             SELECT s, $2 FROM UNNEST($1::text[]) AS s
             ON CONFLICT (type, sequence) DO NOTHING",
            self.table()
        ))
        .bind(sequences)
        .bind(item_type)
        .execute(self.pool())
        .await?
        .rows_affected();

        record_op("seed");
        Ok(inserted)
    }

    /// Clear every unfinished claim held by `bot`. Used to recover items a
    /// crashed or killed bot left behind. Returns the number released.
    pub async fn release_claims(&self, bot: &str) -> Result<u64> {
        let released = sqlx::query(&format!(
            "UPDATE {} SET bot = NULL
             WHERE bot = $1 AND vin IS NULL AND checked_on IS NULL",
            self.table()
        ))
        .bind(bot)
        .execute(self.pool())
        .await?
        .rows_affected();

        record_op("release");
        Ok(released)
    }

    /// Row counts for one item type.
    pub async fn queue_stats(&self, item_type: &str) -> Result<QueueStats> {
        let (unclaimed, claimed, completed, found): (i64, i64, i64, i64) =
            sqlx::query_as(&format!(
                "SELECT
                     COUNT(*) FILTER (WHERE {UNCLAIMED}),
                     COUNT(*) FILTER (WHERE bot IS NOT NULL AND checked_on IS NULL),
                     COUNT(*) FILTER (WHERE checked_on IS NOT NULL),
                     COUNT(*) FILTER (WHERE carfax_records > 0 OR autocheck_records > 0)
                 FROM {} WHERE type = $1",
                self.table()
            ))
            .bind(item_type)
            .fetch_one(self.pool())
            .await?;

        Ok(QueueStats {
            unclaimed,
            claimed,
            completed,
            found,
        })
    }
}

#[async_trait]
impl WorkQueue for super::Db {
    async fn acquire(
        &self,
        item_type: &str,
        start_sequence: Option<&str>,
    ) -> Result<Option<WorkItem>> {
        self.acquire_work(item_type, start_sequence).await
    }

    async fn claim(&self, id: WorkId, bot: &str) -> Result<()> {
        self.tag_work(id, Some(bot)).await
    }

    async fn release(&self, id: WorkId) -> Result<()> {
        self.tag_work(id, None).await
    }

    async fn complete(&self, id: WorkId, completion: &Completion) -> Result<()> {
        self.complete_work(id, completion).await
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct WorkItemRow {
    id: i64,
    sequence: String,
    item_type: String,
    vin: Option<String>,
    carfax_records: Option<i32>,
    autocheck_records: Option<i32>,
    name: Option<String>,
    bot: Option<String>,
    checked_on: Option<DateTime<Utc>>,
}

impl WorkItemRow {
    fn into_work_item(self) -> WorkItem {
        let state =
            ClaimState::from_columns(self.vin.as_deref(), self.bot.as_deref(), self.checked_on);
        let completion = match (&state, self.vin) {
            (ClaimState::Completed, Some(vin)) => Some(Completion {
                vin,
                carfax_records: self.carfax_records.unwrap_or(-1),
                autocheck_records: self.autocheck_records.unwrap_or(-1),
                name: self.name.unwrap_or_default(),
                bot: self.bot.unwrap_or_default(),
            }),
            _ => None,
        };

        WorkItem {
            id: WorkId(self.id),
            sequence: self.sequence,
            item_type: self.item_type,
            state,
            completion,
            checked_on: self.checked_on,
        }
    }
}
