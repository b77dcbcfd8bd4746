//! Secret handling utilities.
//!
//! Re-exports the secrecy types used for the database URL and API key.

pub use secrecy::{ExposeSecret, SecretString};
