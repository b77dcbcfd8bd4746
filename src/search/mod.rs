//! The search loop: claim a sequence number, try each prefix against the
//! record service, record what was found, repeat until the queue runs dry or
//! the service breaks.

pub mod prefixes;
pub mod searcher;

pub use prefixes::PrefixOrder;
pub use searcher::{ItemOutcome, RunOutcome, RunReport, RunSummary, SearchConfig, Searcher};
