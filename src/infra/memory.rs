//! In-memory implementations of the store ports.
//!
//! Suitable for single-process embedding and for tests. A server fronting
//! a relational store implements the same ports; the uniqueness behavior
//! of [`MemoryMessageStore::try_insert`] is the contract such an
//! implementation must reproduce with a unique index.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::application::ports::{
    EndpointStore, InsertOutcome, LogStore, MessageStore, PackageStore,
};
use crate::domain::{Endpoint, ExecutionLog, Message, Package, PackageIdentity};

fn lock_err() -> anyhow::Error {
    anyhow::anyhow!("store mutex poisoned")
}

// ── Packages ──────────────────────────────────────────────────────────────────

/// In-memory package registry keyed by (name, version).
#[derive(Debug, Default)]
pub struct MemoryPackageStore {
    packages: Mutex<HashMap<PackageIdentity, Package>>,
}

impl MemoryPackageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All registered packages, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn all(&self) -> Result<Vec<Package>> {
        Ok(self
            .packages
            .lock()
            .map_err(|_| lock_err())?
            .values()
            .cloned()
            .collect())
    }
}

impl PackageStore for MemoryPackageStore {
    async fn find(&self, identity: &PackageIdentity) -> Result<Option<Package>> {
        Ok(self
            .packages
            .lock()
            .map_err(|_| lock_err())?
            .get(identity)
            .cloned())
    }

    async fn find_by_dir(&self, package_dir: &Path) -> Result<Option<Package>> {
        Ok(self
            .packages
            .lock()
            .map_err(|_| lock_err())?
            .values()
            .find(|p| p.package_dir == package_dir)
            .cloned())
    }

    async fn insert(&self, package: Package) -> Result<()> {
        self.packages
            .lock()
            .map_err(|_| lock_err())?
            .insert(package.identity.clone(), package);
        Ok(())
    }

    async fn remove(&self, identity: &PackageIdentity) -> Result<Option<Package>> {
        Ok(self.packages.lock().map_err(|_| lock_err())?.remove(identity))
    }
}

// ── Endpoints ─────────────────────────────────────────────────────────────────

/// In-memory endpoint registry keyed by endpoint id.
#[derive(Debug, Default)]
pub struct MemoryEndpointStore {
    endpoints: Mutex<HashMap<Uuid, Endpoint>>,
}

impl MemoryEndpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an endpoint by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn get(&self, id: Uuid) -> Result<Option<Endpoint>> {
        Ok(self
            .endpoints
            .lock()
            .map_err(|_| lock_err())?
            .get(&id)
            .cloned())
    }

    /// Number of registered endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.endpoints.lock().map_err(|_| lock_err())?.len())
    }

    /// Whether the registry is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl EndpointStore for MemoryEndpointStore {
    async fn insert(&self, endpoint: Endpoint) -> Result<()> {
        self.endpoints
            .lock()
            .map_err(|_| lock_err())?
            .insert(endpoint.id, endpoint);
        Ok(())
    }

    async fn save_protocol_state(&self, id: Uuid, state: serde_json::Value) -> Result<()> {
        let mut endpoints = self.endpoints.lock().map_err(|_| lock_err())?;
        let endpoint = endpoints
            .get_mut(&id)
            .with_context(|| format!("endpoint {id} is not registered"))?;
        endpoint.protocol_state = Some(state);
        Ok(())
    }

    async fn count_for_package(&self, identity: &PackageIdentity) -> Result<usize> {
        Ok(self
            .endpoints
            .lock()
            .map_err(|_| lock_err())?
            .values()
            .filter(|e| &e.package == identity)
            .count())
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// In-memory message records keyed by message id. The keyed insert stands
/// in for a database uniqueness constraint: an existing record is never
/// overwritten.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    messages: Mutex<HashMap<Uuid, Message>>,
}

impl MemoryMessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of durable records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.messages.lock().map_err(|_| lock_err())?.len())
    }

    /// Whether any record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether a record exists for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn contains(&self, id: Uuid) -> Result<bool> {
        Ok(self.messages.lock().map_err(|_| lock_err())?.contains_key(&id))
    }
}

impl MessageStore for MemoryMessageStore {
    async fn try_insert(&self, message: &Message) -> Result<InsertOutcome> {
        let mut messages = self.messages.lock().map_err(|_| lock_err())?;
        if messages.contains_key(&message.message_id) {
            return Ok(InsertOutcome::Duplicate);
        }
        messages.insert(message.message_id, message.clone());
        Ok(InsertOutcome::Inserted)
    }
}

// ── Logs ──────────────────────────────────────────────────────────────────────

/// Append-only in-memory log sink.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    logs: Mutex<Vec<ExecutionLog>>,
}

impl MemoryLogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store mutex is poisoned.
    pub fn all(&self) -> Result<Vec<ExecutionLog>> {
        Ok(self.logs.lock().map_err(|_| lock_err())?.clone())
    }
}

impl LogStore for MemoryLogStore {
    async fn append(&self, log: ExecutionLog) -> Result<()> {
        self.logs.lock().map_err(|_| lock_err())?.push(log);
        Ok(())
    }
}

/// Convenience bundle of all four in-memory stores.
#[derive(Debug, Default)]
pub struct MemoryStores {
    pub packages: MemoryPackageStore,
    pub endpoints: MemoryEndpointStore,
    pub messages: MemoryMessageStore,
    pub logs: MemoryLogStore,
}

impl MemoryStores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
