//! Record lookup: ask a remote history service whether a VIN exists.
//!
//! Any failure to get a usable answer is a [`LookupError`]. The search loop
//! does not retry these; a broken service stops the bot.

pub mod carfax_checks;

pub use carfax_checks::CarfaxChecksClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::lookup::LookupResult;
use crate::vin::Vin;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// A service that reports history record counts for a VIN.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    async fn lookup(&self, vin: &Vin) -> Result<LookupResult, LookupError>;
}
