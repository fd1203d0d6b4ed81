//! mindbridge-cli library root.
//!
//! Modules are public so integration tests can reach the config layer
//! without going through the binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod interactive;
