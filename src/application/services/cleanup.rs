//! Package removal.
//!
//! Reference integrity and the on-disk cascade are handled here
//! explicitly, with no store-level triggers. The installer's
//! controlled-overwrite path and the owning service layer both route
//! through this.

use anyhow::Result;

use crate::application::ports::{EndpointStore, PackageStore};
use crate::domain::{InstallError, PackageIdentity};

/// Remove a package registration together with its unpacked tree and
/// stored bundle.
///
/// Refused while any endpoint references the package: deployed instances
/// cannot be updated remotely, so the server must keep serving their
/// metadata.
///
/// # Errors
///
/// Returns [`InstallError::PackageInUse`] if endpoints reference the
/// package, or an error if the identity is unknown or deletion fails.
pub async fn remove_package(
    packages: &impl PackageStore,
    endpoints: &impl EndpointStore,
    identity: &PackageIdentity,
) -> Result<()> {
    let references = endpoints.count_for_package(identity).await?;
    if references > 0 {
        return Err(InstallError::PackageInUse {
            name: identity.name.clone(),
            version: identity.version.clone(),
        }
        .into());
    }

    let Some(package) = packages.remove(identity).await? else {
        anyhow::bail!("package {identity} is not registered");
    };

    if package.package_dir.exists() {
        std::fs::remove_dir_all(&package.package_dir)?;
    }
    if package.bundle_file.exists() {
        std::fs::remove_file(&package.bundle_file)?;
    }
    tracing::info!(package = %identity, "removed package, unpacked tree, and stored bundle");
    Ok(())
}
