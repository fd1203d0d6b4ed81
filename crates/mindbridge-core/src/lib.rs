//! mindbridge-core
//!
//! Pure domain types and form validation. No HTTP dependency. This is the shared
//! vocabulary of the API client, the bot driver and the CLI.

pub mod error;
pub mod models;
pub mod validation;
