//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`.
//! The store ports stand in for the collaborating persistence layer: the
//! core needs durable lookups by identifier, not a particular database.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use uuid::Uuid;

use crate::domain::{Endpoint, ExecutionLog, Message, Package, PackageIdentity};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with the working directory pinned to `dir`, capturing
    /// both output streams.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds
    /// `timeout`. On timeout, the child process must be killed (not left
    /// orphaned).
    async fn run_in(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Store Ports ───────────────────────────────────────────────────────────────

/// Durable package lookups and registration.
#[allow(async_fn_in_trait)]
pub trait PackageStore {
    /// Look up a package by its (name, version) identity.
    async fn find(&self, identity: &PackageIdentity) -> Result<Option<Package>>;
    /// Look up the package that claims `package_dir`, if any. Used to tell
    /// a stale unpacked directory from one a registered package owns.
    async fn find_by_dir(&self, package_dir: &Path) -> Result<Option<Package>>;
    /// Register a package.
    async fn insert(&self, package: Package) -> Result<()>;
    /// Remove a package registration, returning it if it existed.
    async fn remove(&self, identity: &PackageIdentity) -> Result<Option<Package>>;
}

/// Durable endpoint registration and protocol-state persistence.
#[allow(async_fn_in_trait)]
pub trait EndpointStore {
    /// Register a freshly built endpoint.
    async fn insert(&self, endpoint: Endpoint) -> Result<()>;
    /// Persist an endpoint's protocol state. Last writer wins.
    async fn save_protocol_state(&self, id: Uuid, state: serde_json::Value) -> Result<()>;
    /// How many endpoints reference the given package.
    async fn count_for_package(&self, identity: &PackageIdentity) -> Result<usize>;
}

/// Outcome of an attempted durable message insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with this message id already exists; the existing record
    /// is never overwritten.
    Duplicate,
}

/// Durable message records. The attempted insert is the single source of
/// truth for deduplication: there is no separate seen-set, and send and
/// receive share one identity space.
#[allow(async_fn_in_trait)]
pub trait MessageStore {
    /// Record a message by its id, reporting whether it was new.
    async fn try_insert(&self, message: &Message) -> Result<InsertOutcome>;
}

/// Append-only execution log sink.
#[allow(async_fn_in_trait)]
pub trait LogStore {
    /// Append one immutable log record.
    async fn append(&self, log: ExecutionLog) -> Result<()>;
}
