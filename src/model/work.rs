//! Work item types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// One sequence number to search, as stored in the shared queue table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkId,

    /// Variable VIN suffix, appended to each prefix in turn.
    pub sequence: String,

    /// Subset of the table this row belongs to (e.g. "2021", "2021mach1").
    pub item_type: String,

    pub state: ClaimState,

    /// Present once the item has been completed.
    pub completion: Option<Completion>,

    pub checked_on: Option<DateTime<Utc>>,
}

/// Newtype for work item IDs (the table's primary key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkId(pub i64);

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Claim State
// ---------------------------------------------------------------------------

/// Processing state of a work item.
///
/// Claims are advisory: a claim is a plain write of the bot's name, not a
/// lease, and a crashed bot leaves its claim behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "bot")]
pub enum ClaimState {
    Unclaimed,
    Claimed(String),
    Completed,
}

impl ClaimState {
    /// Derive the state from the row's result columns.
    pub fn from_columns(
        vin: Option<&str>,
        bot: Option<&str>,
        checked_on: Option<DateTime<Utc>>,
    ) -> Self {
        match (vin, bot, checked_on) {
            (None, None, None) => ClaimState::Unclaimed,
            (None, Some(bot), None) => ClaimState::Claimed(bot.to_string()),
            _ => ClaimState::Completed,
        }
    }

    pub fn is_unclaimed(&self) -> bool {
        matches!(self, ClaimState::Unclaimed)
    }
}

impl std::fmt::Display for ClaimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimState::Unclaimed => write!(f, "unclaimed"),
            ClaimState::Claimed(bot) => write!(f, "claimed by {bot}"),
            ClaimState::Completed => write!(f, "completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Result fields written onto a work item when a bot finishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// The last candidate looked up. Empty when no prefix produced a valid VIN.
    pub vin: String,
    pub carfax_records: i32,
    pub autocheck_records: i32,
    /// Vehicle display name, usually year, make and model.
    pub name: String,
    pub bot: String,
}

impl Completion {
    pub fn is_found(&self) -> bool {
        self.carfax_records > 0 || self.autocheck_records > 0
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Sequence numbers from `from` to `to` inclusive, zero-padded to the width
/// of `from`. Returns an empty list when either bound is not a number or the
/// range is reversed.
pub fn sequence_range(from: &str, to: &str) -> Vec<String> {
    let (Ok(start), Ok(end)) = (from.parse::<u64>(), to.parse::<u64>()) else {
        return Vec::new();
    };
    let width = from.len();
    (start..=end).map(|n| format!("{n:0width$}")).collect()
}

/// True if `raw` can be used as a sequence number: ASCII digits only, and
/// small enough to compare numerically.
pub fn is_sequence(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) && raw.parse::<i64>().is_ok()
}
