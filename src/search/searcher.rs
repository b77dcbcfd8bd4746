//! Per-bot search loop.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use rand::Rng;
use tracing::{Instrument, Span, debug, error, info, warn};

use super::prefixes::PrefixOrder;
use crate::error::Error;
use crate::lookup::{LookupError, RecordLookup};
use crate::model::lookup::LookupResult;
use crate::model::work::{Completion, WorkId, WorkItem};
use crate::queue::WorkQueue;
use crate::telemetry::metrics;
use crate::telemetry::work::{record_state_transition, start_item_span};
use crate::vin::{Vin, add_check_digit};

/// What one bot searches and how politely.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Worker identity written onto claimed and completed items.
    pub bot: String,
    pub item_type: String,
    /// Walk sequences upward from here instead of picking at random.
    pub start_sequence: Option<String>,
    /// Pause between lookups, in whole seconds, inclusive.
    pub delay_secs: RangeInclusive<u64>,
}

/// How the search for one item ended.
#[derive(Debug)]
pub enum ItemOutcome {
    /// A prefix produced a VIN with history records.
    Found {
        prefix_index: usize,
        vin: Vin,
        result: LookupResult,
    },
    /// Every prefix was tried without a hit; carries the last one tried.
    Exhausted { vin: Vin, result: LookupResult },
    /// No prefix combined with this sequence into a valid VIN. The prefix
    /// list does not fit this queue; the item is released, never recorded.
    Rejected,
    /// The record service failed; nothing should be recorded.
    Aborted { vin: Vin, error: LookupError },
}

impl ItemOutcome {
    /// Prefix order for the next item: a hit floats its prefix to the front,
    /// anything else keeps the current order.
    pub fn reorder(&self, prefixes: PrefixOrder) -> PrefixOrder {
        match self {
            ItemOutcome::Found { prefix_index, .. } => prefixes.promote(*prefix_index),
            _ => prefixes,
        }
    }

    /// Result fields to write for this outcome. `None` when the item must
    /// be released instead.
    pub fn completion(&self, bot: &str) -> Option<Completion> {
        match self {
            ItemOutcome::Found { vin, result, .. } | ItemOutcome::Exhausted { vin, result } => {
                Some(Completion {
                    vin: vin.to_string(),
                    carfax_records: result.carfax_records,
                    autocheck_records: result.autocheck_records,
                    name: result.name.clone(),
                    bot: bot.to_string(),
                })
            }
            ItemOutcome::Rejected | ItemOutcome::Aborted { .. } => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Found { .. } => "found",
            ItemOutcome::Exhausted { .. } => "exhausted",
            ItemOutcome::Rejected => "rejected",
            ItemOutcome::Aborted { .. } => "released",
        }
    }
}

/// Why a run stopped.
#[derive(Debug)]
pub enum RunOutcome {
    /// No unclaimed items left.
    Complete,
    /// A lookup failed. The item was released and the run stopped.
    Aborted {
        item: WorkId,
        vin: Vin,
        error: LookupError,
    },
    /// No prefix made a valid VIN with this item's sequence. The item was
    /// released and the run stopped.
    InvalidCandidates { item: WorkId, sequence: String },
    /// The queue could not be read.
    QueueUnavailable(Error),
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items completed, whether or not anything was found.
    pub items: u64,
    pub found: u64,
    pub lookups: u64,
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub summary: RunSummary,
    /// Prefix order as it stood when the run stopped.
    pub prefixes: PrefixOrder,
}

/// One bot: pulls items from a queue and checks candidates against a
/// record service, one request at a time.
pub struct Searcher<Q, L> {
    queue: Arc<Q>,
    lookup: Arc<L>,
    config: SearchConfig,
}

impl<Q: WorkQueue, L: RecordLookup> Searcher<Q, L> {
    pub fn new(queue: Arc<Q>, lookup: Arc<L>, config: SearchConfig) -> Self {
        Self {
            queue,
            lookup,
            config,
        }
    }

    /// Run until the queue is empty, the queue fails, a lookup fails, or an
    /// item yields no valid candidate.
    pub async fn run(&self, mut prefixes: PrefixOrder) -> RunReport {
        let bot = self.config.bot.as_str();
        info!(
            bot,
            item_type = %self.config.item_type,
            start_sequence = ?self.config.start_sequence,
            prefixes = prefixes.len(),
            "STARTING"
        );

        let mut summary = RunSummary::default();
        loop {
            let acquired = self
                .queue
                .acquire(
                    &self.config.item_type,
                    self.config.start_sequence.as_deref(),
                )
                .await;

            let item = match acquired {
                Ok(Some(item)) => item,
                Ok(None) => {
                    info!(bot, ?summary, "COMPLETE - no more rows");
                    return RunReport {
                        outcome: RunOutcome::Complete,
                        summary,
                        prefixes,
                    };
                }
                Err(e) => {
                    error!(bot, error = %e, ?summary, "queue unavailable");
                    return RunReport {
                        outcome: RunOutcome::QueueUnavailable(e),
                        summary,
                        prefixes,
                    };
                }
            };

            let span = start_item_span(bot, item.id, &item.sequence);
            let outcome = self
                .process(&item, &prefixes, &mut summary, &span)
                .instrument(span.clone())
                .await;

            match outcome {
                ItemOutcome::Aborted { vin, error } => {
                    error!(bot, item_id = %item.id, %vin, %error, ?summary, "API failed");
                    return RunReport {
                        outcome: RunOutcome::Aborted {
                            item: item.id,
                            vin,
                            error,
                        },
                        summary,
                        prefixes,
                    };
                }
                ItemOutcome::Rejected => {
                    error!(
                        bot,
                        item_id = %item.id,
                        sequence = %item.sequence,
                        ?summary,
                        "no prefix makes a valid VIN, check the target's prefixes"
                    );
                    return RunReport {
                        outcome: RunOutcome::InvalidCandidates {
                            item: item.id,
                            sequence: item.sequence.clone(),
                        },
                        summary,
                        prefixes,
                    };
                }
                ItemOutcome::Found { .. } | ItemOutcome::Exhausted { .. } => {}
            }

            prefixes = outcome.reorder(prefixes);
            debug!(order = ?prefixes.as_slice(), "prefix order for next item");
        }
    }

    /// Claim one item, search it, and record or release it.
    async fn process(
        &self,
        item: &WorkItem,
        prefixes: &PrefixOrder,
        summary: &mut RunSummary,
        span: &Span,
    ) -> ItemOutcome {
        let bot = self.config.bot.as_str();

        // Claims are advisory; a failed claim write does not stop the search.
        if let Err(e) = self.queue.claim(item.id, bot).await {
            warn!(item_id = %item.id, error = %e, "failed to tag item as claimed");
        }
        record_state_transition(span, "unclaimed", "claimed");

        let outcome = self.search_item(item, prefixes, summary).await;
        metrics::items().add(1, &[KeyValue::new("outcome", outcome.label())]);

        match outcome.completion(bot) {
            Some(completion) => {
                summary.items += 1;
                if completion.is_found() {
                    summary.found += 1;
                }
                match self.queue.complete(item.id, &completion).await {
                    Ok(()) => {
                        info!(
                            item_id = %item.id,
                            vin = %completion.vin,
                            carfax_records = completion.carfax_records,
                            autocheck_records = completion.autocheck_records,
                            name = %completion.name,
                            "item completed"
                        );
                        record_state_transition(span, "claimed", "completed");
                    }
                    Err(e) => {
                        error!(
                            item_id = %item.id,
                            vin = %completion.vin,
                            error = %e,
                            "failed to record result"
                        );
                    }
                }
            }
            None => {
                if let Err(e) = self.queue.release(item.id).await {
                    error!(item_id = %item.id, error = %e, "failed to release claim");
                }
                record_state_transition(span, "claimed", "unclaimed");
            }
        }

        outcome
    }

    /// Try each prefix in order with the item's sequence number.
    pub async fn search_item(
        &self,
        item: &WorkItem,
        prefixes: &PrefixOrder,
        summary: &mut RunSummary,
    ) -> ItemOutcome {
        let mut last = None;

        for (prefix_index, prefix) in prefixes.iter().enumerate() {
            let candidate = format!("{prefix}{}", item.sequence);
            let vin = match add_check_digit(&candidate) {
                Ok(vin) => vin,
                Err(e) => {
                    warn!(%candidate, prefix_index, error = %e, "skipping invalid candidate");
                    continue;
                }
            };
            info!(%vin, prefix_index, "checking candidate");

            summary.lookups += 1;
            let result = match self.lookup.lookup(&vin).await {
                Ok(result) => result,
                Err(error) => {
                    metrics::lookups().add(1, &[KeyValue::new("result", "error")]);
                    return ItemOutcome::Aborted { vin, error };
                }
            };

            let hit = result.success();
            metrics::lookups().add(
                1,
                &[KeyValue::new("result", if hit { "found" } else { "not_found" })],
            );
            debug!(%vin, ?result, "lookup result");

            self.pause().await;

            if hit {
                return ItemOutcome::Found {
                    prefix_index,
                    vin,
                    result,
                };
            }
            last = Some((vin, result));
        }

        match last {
            Some((vin, result)) => ItemOutcome::Exhausted { vin, result },
            None => ItemOutcome::Rejected,
        }
    }

    /// Politeness delay, drawn uniformly from the configured range.
    async fn pause(&self) {
        let secs = draw_delay(&self.config.delay_secs, &mut rand::thread_rng());
        if secs > 0 {
            debug!(secs, "pausing before next lookup");
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }
}

/// Pick a pause length from `range`. An empty range yields its start.
fn draw_delay<R: Rng + ?Sized>(range: &RangeInclusive<u64>, rng: &mut R) -> u64 {
    if range.is_empty() {
        *range.start()
    } else {
        rng.gen_range(range.clone())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn delay_stays_inside_the_inclusive_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 4];
        for _ in 0..500 {
            let secs = draw_delay(&(2..=5), &mut rng);
            assert!((2..=5).contains(&secs), "{secs}");
            seen[(secs - 2) as usize] = true;
        }
        // Both ends are reachable.
        assert!(seen.iter().all(|s| *s), "{seen:?}");
    }

    #[test]
    fn single_value_and_empty_ranges() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(draw_delay(&(0..=0), &mut rng), 0);
        assert_eq!(draw_delay(&(30..=30), &mut rng), 30);
        #[allow(clippy::reversed_empty_ranges)]
        let backwards = 9..=3;
        assert_eq!(draw_delay(&backwards, &mut rng), 9);
    }
}
