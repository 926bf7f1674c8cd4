//! Installed package records and their on-disk metadata.
//!
//! A package is the unpacked form of an agent or protocol bundle. Once
//! installed, its directory always contains the three required metadata
//! files; the accessors here read them lazily so the store only has to
//! persist paths and identity.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata files every installed package must expose after its `install`
/// target has run. Their internal schema is owned by the package, not by
/// the server; only the descriptor's `name` and `version` are interpreted.
pub const REQUIRED_METADATA_FILES: [&str; 3] =
    ["agent.json", "commands.json", "protocols.json"];

/// Descriptor file holding the package's self-declared identity.
pub const DESCRIPTOR_FILE: &str = "agent.json";

/// Command catalog file.
pub const COMMANDS_FILE: &str = "commands.json";

/// Protocol catalog file.
pub const PROTOCOLS_FILE: &str = "protocols.json";

// ── Identity ──────────────────────────────────────────────────────────────────

/// A package's unique identity: self-declared name and version.
///
/// Different versions of the same agent are distinct packages: deployed
/// instances cannot be remotely updated, so the server keeps metadata for
/// every version an endpoint may still be running.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
}

impl PackageIdentity {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageIdentity {
    /// Canonical rendering, used for directory and artifact naming.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

// ── Descriptor ────────────────────────────────────────────────────────────────

/// The typed slice of `agent.json` the server reads. Everything else is
/// agent-owned and passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PackageDescriptor {
    #[must_use]
    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity::new(self.name.clone(), self.version.clone())
    }
}

// ── Package record ────────────────────────────────────────────────────────────

/// An installed package: identity plus durable locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub identity: PackageIdentity,
    /// Directory holding the unpacked contents with metadata generated.
    pub package_dir: PathBuf,
    /// Durable copy of the original bundle. Preferred for redistribution
    /// over re-archiving the unpacked tree, which may have accumulated
    /// server-side files that should not ship.
    pub bundle_file: PathBuf,
    /// SHA-256 of the stored bundle, recorded at install time.
    pub bundle_sha256: String,
    pub installed_at: DateTime<Utc>,
}

impl Package {
    fn read_metadata_json(&self, file: &str) -> Result<serde_json::Value> {
        let path = self.package_dir.join(file);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// The agent descriptor (`agent.json`) as a loose document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not valid JSON.
    pub fn agent_metadata(&self) -> Result<serde_json::Value> {
        self.read_metadata_json(DESCRIPTOR_FILE)
    }

    /// All commands this package supports (`commands.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not valid JSON.
    pub fn command_catalog(&self) -> Result<serde_json::Value> {
        self.read_metadata_json(COMMANDS_FILE)
    }

    /// All protocols this package can speak (`protocols.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not valid JSON.
    pub fn protocol_catalog(&self) -> Result<serde_json::Value> {
        self.read_metadata_json(PROTOCOLS_FILE)
    }
}

/// Names the required metadata file missing from `package_dir`, if any.
#[must_use]
pub fn missing_metadata_file(package_dir: &Path) -> Option<&'static str> {
    REQUIRED_METADATA_FILES
        .into_iter()
        .find(|file| !package_dir.join(file).exists())
}
