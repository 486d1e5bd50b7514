//! monty - review and auto-merge bot for GitHub pull requests
//!
//! Pull requests are synced from GitHub into a local store, evaluated
//! against a tree of conditions (approvals, inline commands, build status),
//! and merged once every condition passes. A lease-based lock keeps several
//! running instances from evaluating or merging the same pull request at
//! once.

pub mod auth;
pub mod config;
pub mod error;
pub mod lock;
pub mod merge;
pub mod platform;
pub mod progress;
pub mod review;
pub mod store;
pub mod sync;
pub mod types;

pub use error::{Error, Result};
