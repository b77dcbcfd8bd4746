//! # vinhunt
//!
//! Bots that search for real VINs by brute force. Each bot pulls sequence
//! numbers from a shared Postgres table, combines them with known prefixes,
//! fixes the check digit, and asks a record service whether the vehicle
//! exists. Results go back into the same table so bots never repeat work.

pub mod config;
pub mod db;
pub mod error;
pub mod lookup;
pub mod model;
pub mod queue;
pub mod search;
pub mod telemetry;
pub mod vin;
