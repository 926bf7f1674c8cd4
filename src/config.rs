//! Core configuration, injected explicitly into every service call.
//!
//! There is no ambient global state: the embedding server constructs one
//! `CoreConfig` and passes it by reference wherever the core needs paths,
//! key material, or policy.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default ceiling on a single build-target invocation. The invoked script
/// is opaque and untrusted, so it never gets to run unbounded.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(600);

/// Settings shared by the installer, payload builder, and message
/// exchange.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Root directory for unpacked packages.
    pub package_root: PathBuf,
    /// Root directory for durable artifacts (stored bundles and payloads).
    pub artifact_root: PathBuf,
    /// Server private key injected into send exchanges, base64-encoded.
    /// Never written on a receive.
    pub server_private_key: Option<String>,
    /// Ceiling on one build-target invocation; the child is killed on
    /// expiry.
    pub build_timeout: Duration,
    /// When true, a non-zero build exit aborts before output harvesting.
    /// When false the exit code is only warned about and the presence of
    /// required output files is authoritative.
    pub fail_on_exit_code: bool,
}

impl CoreConfig {
    /// Configuration with default policy: ten-minute build timeout,
    /// warn-and-continue on non-zero exit codes, no server key.
    #[must_use]
    pub fn new(package_root: impl Into<PathBuf>, artifact_root: impl Into<PathBuf>) -> Self {
        Self {
            package_root: package_root.into(),
            artifact_root: artifact_root.into(),
            server_private_key: None,
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            fail_on_exit_code: false,
        }
    }

    /// Where durable copies of original bundles live.
    #[must_use]
    pub fn bundles_dir(&self) -> PathBuf {
        self.artifact_root.join("bundles")
    }

    /// Where built payload artifacts live.
    #[must_use]
    pub fn payloads_dir(&self) -> PathBuf {
        self.artifact_root.join("payloads")
    }

    /// The canonical unpacked directory for a package identity.
    #[must_use]
    pub fn package_dir(&self, canonical_name: &str) -> PathBuf {
        self.package_root.join(canonical_name)
    }
}

/// Root a test-style configuration under one directory.
#[must_use]
pub fn config_under(root: &Path) -> CoreConfig {
    CoreConfig::new(root.join("packages"), root.join("artifacts"))
}
