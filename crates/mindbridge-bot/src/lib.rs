//! Conversation driver and client-side state.
//!
//! Everything here talks to the backend through [`backend::Backend`], so the
//! flows can be exercised without a server.

pub mod backend;
pub mod children;
pub mod error;
pub mod flow;
pub mod questionnaires;
pub mod review;
pub mod store;
pub mod transcript;
