//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, or `std::process`. All error types implement
//! `thiserror::Error` and convert to `anyhow::Error` via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

// ── Staging errors ────────────────────────────────────────────────────────────

/// Errors raised while creating an isolated working copy of a package.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("package directory {0} does not exist")]
    SourceMissing(PathBuf),
}

// ── Build invocation errors ───────────────────────────────────────────────────

/// Errors raised while locating or running a package build target.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build script {0} is missing from the staged directory")]
    MissingBuildScript(PathBuf),

    #[error("build target '{target}' exited with {code:?}")]
    TargetFailed { target: String, code: Option<i32> },

    #[error("build target '{target}' timed out after {seconds}s")]
    Timeout { target: String, seconds: u64 },
}

// ── Contract errors ───────────────────────────────────────────────────────────

/// Errors raised while harvesting required output files from a staged
/// invocation. One variant per artifact so callers can tell exactly which
/// part of the contract the package violated.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("missing execution log at {0}")]
    MissingLog(PathBuf),

    #[error("missing message batch at {0} (an empty array means 'nothing received'; absence is a contract violation)")]
    MissingMessageBatch(PathBuf),

    #[error("missing final endpoint configuration at {0}")]
    MissingFinalConfig(PathBuf),

    #[error("missing payload artifact at {0}")]
    MissingPayload(PathBuf),

    #[error("malformed {file}: {reason}")]
    Malformed { file: String, reason: String },
}

// ── Install errors ────────────────────────────────────────────────────────────

/// Errors raised while installing a package bundle.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("bundle {0} does not exist")]
    BundleMissing(PathBuf),

    #[error("decompression target {0} already exists")]
    TargetExists(PathBuf),

    #[error("package is missing required metadata file '{0}'")]
    IncompleteMetadata(String),

    #[error("package {name}-{version} is in use by existing endpoints")]
    PackageInUse { name: String, version: String },
}

// ── Exchange errors ───────────────────────────────────────────────────────────

/// Errors raised while exchanging messages with an endpoint.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("message {0} has already been recorded; re-sending an identifier indicates a caller bug")]
    DuplicateMessage(Uuid),
}
