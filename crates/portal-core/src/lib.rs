//! Core types and the topic submission-window engine for the contribution
//! portal.
//!
//! This crate has no HTTP dependencies. Everything that
//! talks to the portal backend goes through the [`backend::PortalBackend`]
//! trait; the `portal-cli` crate supplies the reqwest implementation.
//!
//! Nothing in here reads the system clock. Every function that depends on
//! the current instant takes `now` as a parameter so a batch of topics is
//! classified against one consistent reference point.

pub mod attachment;
pub mod backend;
pub mod collection;
pub mod contribution;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod gate;
pub mod topic;
pub mod validate;
pub mod window;

pub use error::{Error, Invalid, Result};

#[cfg(test)]
mod tests;
