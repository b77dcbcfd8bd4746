//! Core data model.
//!
//! A work item is one sequence number to search. A lookup result is what the
//! record service said about one candidate VIN.

pub mod lookup;
pub mod work;
