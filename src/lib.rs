//! Courier control-server core.
//!
//! Drives opaque, independently-built agent and protocol packages through
//! a filesystem-mediated execution contract: stage an isolated working
//! copy, write the input documents, run a conventionally named build
//! target, and harvest the output files. Package installation, payload
//! builds, and message exchange all share that pattern; this crate
//! implements all three plus the contract they rely on.
//!
//! The surrounding server (HTTP surface, auth, relational persistence,
//! task queue) is out of scope and represented by the port traits in
//! [`application::ports`].

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

pub use config::CoreConfig;
