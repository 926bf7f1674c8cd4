//! Package installation from bundles.
//!
//! A bundle is unpacked under the package root, its `install` target is
//! run to generate metadata, and the result is relocated to the canonical
//! `{name}-{version}` directory with the original bundle copied into
//! durable artifact storage. Any failure removes the partially unpacked
//! tree; nothing is registered for a failed install.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::{CommandRunner, EndpointStore, LogStore, PackageStore};
use crate::application::services::cleanup::remove_package;
use crate::application::services::invoke::{self, BuildTarget};
use crate::config::CoreConfig;
use crate::domain::package::{DESCRIPTOR_FILE, missing_metadata_file};
use crate::domain::{ExecutionLog, InstallError, LogCategory, Package, PackageDescriptor};
use crate::infra::bundle;

/// Install an agent or protocol package from a bundle.
///
/// Re-installing a (name, version) that is already registered is a
/// controlled overwrite when the existing package has no endpoints;
/// otherwise the install is refused and the existing package is untouched.
///
/// # Errors
///
/// Returns [`InstallError`] variants for contract violations
/// (missing bundle, decompression-target collision, incomplete metadata,
/// package in use), or any staging/build/I-O error. No partial state is
/// persisted on failure.
#[allow(clippy::too_many_arguments)]
pub async fn install_package(
    config: &CoreConfig,
    runner: &impl CommandRunner,
    packages: &impl PackageStore,
    endpoints: &impl EndpointStore,
    logs: &impl LogStore,
    bundle_path: &Path,
    user: Option<String>,
    task_id: Option<Uuid>,
) -> Result<Package> {
    if !bundle_path.exists() {
        return Err(InstallError::BundleMissing(bundle_path.to_path_buf()).into());
    }

    std::fs::create_dir_all(&config.package_root)
        .with_context(|| format!("creating {}", config.package_root.display()))?;

    // The bundle's own base name is the decompression target. It need not
    // match the declared package name, but a collision here is a hard stop:
    // a fresh name is required before anything is inspected.
    let target_dir = config.package_root.join(bundle::bundle_stem(bundle_path));
    if target_dir.exists() {
        return Err(InstallError::TargetExists(target_dir).into());
    }
    bundle::unpack(bundle_path, &target_dir)?;
    tracing::info!(bundle = %bundle_path.display(), target = %target_dir.display(), "unpacked bundle");

    let mut work_dir = target_dir;
    let result = register_unpacked(
        config,
        runner,
        packages,
        endpoints,
        logs,
        bundle_path,
        &mut work_dir,
        user,
        task_id,
    )
    .await;
    if result.is_err() && work_dir.exists() {
        // Failed installs leave nothing behind.
        let _ = std::fs::remove_dir_all(&work_dir);
    }
    result
}

/// The fallible tail of an install. `work_dir` tracks where the unpacked
/// tree currently lives so the caller can clean up after the canonical
/// rename as well as before it.
#[allow(clippy::too_many_arguments)]
async fn register_unpacked(
    config: &CoreConfig,
    runner: &impl CommandRunner,
    packages: &impl PackageStore,
    endpoints: &impl EndpointStore,
    logs: &impl LogStore,
    bundle_path: &Path,
    work_dir: &mut PathBuf,
    user: Option<String>,
    task_id: Option<Uuid>,
) -> Result<Package> {
    let output = invoke::run_target(runner, config, work_dir, BuildTarget::Install).await?;
    logs.append(
        ExecutionLog::new(LogCategory::Install, invoke::render_output(&output))
            .with_user(user)
            .with_task(task_id),
    )
    .await?;

    if let Some(file) = missing_metadata_file(work_dir) {
        return Err(InstallError::IncompleteMetadata(file.to_string()).into());
    }

    let descriptor_path = work_dir.join(DESCRIPTOR_FILE);
    let descriptor: PackageDescriptor = serde_json::from_str(
        &std::fs::read_to_string(&descriptor_path)
            .with_context(|| format!("reading {}", descriptor_path.display()))?,
    )
    .with_context(|| format!("parsing {}", descriptor_path.display()))?;
    let identity = descriptor.identity();

    // Same (name, version) already registered: overwrite only if nothing
    // deployed depends on it.
    if let Some(existing) = packages.find(&identity).await? {
        if endpoints.count_for_package(&identity).await? > 0 {
            return Err(InstallError::PackageInUse {
                name: identity.name,
                version: identity.version,
            }
            .into());
        }
        tracing::warn!(package = %identity, "overwriting installed package with no endpoints");
        remove_package(packages, endpoints, &existing.identity).await?;
    }

    let final_dir = config.package_dir(&identity.to_string());
    if final_dir.exists() && final_dir != *work_dir {
        // The canonical name can be occupied by a directory no registered
        // package claims, e.g. after a crash between unpack and register.
        if packages.find_by_dir(&final_dir).await?.is_none() {
            tracing::warn!(dir = %final_dir.display(), "removing dangling package directory");
            std::fs::remove_dir_all(&final_dir)
                .with_context(|| format!("removing {}", final_dir.display()))?;
        }
    }
    if std::fs::rename(&*work_dir, &final_dir).is_err() {
        return Err(InstallError::PackageInUse {
            name: identity.name,
            version: identity.version,
        }
        .into());
    }
    *work_dir = final_dir.clone();

    let bundles_dir = config.bundles_dir();
    std::fs::create_dir_all(&bundles_dir)
        .with_context(|| format!("creating {}", bundles_dir.display()))?;
    let bundle_dest = bundles_dir.join(format!("{identity}.tar.gz"));
    std::fs::copy(bundle_path, &bundle_dest)
        .with_context(|| format!("storing bundle at {}", bundle_dest.display()))?;
    let bundle_sha256 = bundle::sha256_file(&bundle_dest)?;

    let package = Package {
        identity: identity.clone(),
        package_dir: final_dir,
        bundle_file: bundle_dest,
        bundle_sha256,
        installed_at: Utc::now(),
    };
    packages.insert(package.clone()).await?;
    tracing::info!(package = %identity, dir = %package.package_dir.display(), "installed package");
    Ok(package)
}
