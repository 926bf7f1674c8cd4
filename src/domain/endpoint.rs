//! Endpoint records and the harvested configuration that creates them.
//!
//! An endpoint is a device a payload has been built for. Its identifier is
//! minted by the package's payload build, never by the server, so the same
//! id appears inside the deployed payload and in the server's records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::package::PackageIdentity;

// ── Harvested configuration ───────────────────────────────────────────────────

/// The final configuration document a payload build leaves behind
/// (`agent_cfg.json`). Structurally identical to the build input, but with
/// build-resolved values filled in, including the new endpoint id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub agent_config: AgentSettings,
    /// Protocol-owned settings, passed through untouched.
    #[serde(default)]
    pub protocol_config: serde_json::Value,
}

/// The agent-owned section of the configuration. Only `endpoint_id` is
/// interpreted; the rest belongs to the package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Endpoint identifier minted by the build.
    pub endpoint_id: Uuid,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Caller-supplied fields ────────────────────────────────────────────────────

/// Descriptive fields the caller may attach to a freshly built endpoint.
///
/// Deliberately excludes payload and peer-connection fields: those are
/// build-owned or post-hoc-only for a non-virtual endpoint, so the type
/// simply cannot carry them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// ── Endpoint record ───────────────────────────────────────────────────────────

/// A device the server can exchange messages with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Whether this record describes a device without an installed agent.
    /// Endpoints minted by a payload build are never virtual.
    pub is_virtual: bool,
    /// The package this endpoint's payload was built from.
    pub package: PackageIdentity,
    /// Harvested configuration, re-injected into every message exchange.
    pub config: EndpointConfig,
    /// Opaque protocol state, updated by every exchange that emits one.
    /// Last writer wins; there is no in-core serialization of exchanges.
    #[serde(default)]
    pub protocol_state: Option<serde_json::Value>,
    /// Durable payload artifact built for this endpoint.
    #[serde(default)]
    pub payload_file: Option<PathBuf>,
}

impl Endpoint {
    /// Assemble a non-virtual endpoint from a payload build's outputs and
    /// the caller's descriptive fields.
    #[must_use]
    pub fn from_build(
        config: EndpointConfig,
        package: PackageIdentity,
        payload_file: PathBuf,
        draft: EndpointDraft,
    ) -> Self {
        Self {
            id: config.agent_config.endpoint_id,
            name: draft.name,
            hostname: draft.hostname,
            address: draft.address,
            is_virtual: false,
            package,
            config,
            protocol_state: None,
            payload_file: Some(payload_file),
        }
    }
}
