//! mindbridge-api
//!
//! Typed HTTP client for the questionnaire backend. Thin wrapper around
//! reqwest: one free function per endpoint, grouped by route prefix, plus
//! the incremental decoder for the streamed chat endpoint.

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod children;
pub mod client;
pub mod error;
pub mod review;
pub mod session;
pub mod sse;
