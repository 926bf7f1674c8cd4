//! Payload builds.
//!
//! A payload build stages a copy of an installed package, hands it the
//! caller's build arguments, and harvests three outputs: the build log,
//! the final configuration (carrying the build-minted endpoint id), and
//! the deliverable artifact. The endpoint is persisted last, so a failure
//! at any earlier step leaves no partially constructed endpoint behind.

use anyhow::Result;
use uuid::Uuid;

use crate::application::ports::{CommandRunner, EndpointStore, LogStore};
use crate::application::services::invoke::{self, BuildTarget};
use crate::config::CoreConfig;
use crate::domain::{Endpoint, EndpointDraft, ExecutionLog, LogCategory, Package};
use crate::infra::{contract, staging};

/// Build a payload from an installed package and register the resulting
/// endpoint.
///
/// The build process, not the server, mints the endpoint identifier; it
/// is read back out of the final configuration. Caller input is limited
/// to build arguments and the descriptive fields in [`EndpointDraft`].
///
/// # Errors
///
/// Returns a staging error if the package directory is gone, a build
/// error for a missing build script, and a distinct contract error for
/// each required output that is absent (log, final configuration, payload
/// artifact). On failure nothing is persisted except the execution log,
/// which is harvested first precisely so partial failures stay
/// diagnosable.
#[allow(clippy::too_many_arguments)]
pub async fn build_payload(
    config: &CoreConfig,
    runner: &impl CommandRunner,
    endpoints: &impl EndpointStore,
    logs: &impl LogStore,
    package: &Package,
    build_args: &serde_json::Value,
    draft: EndpointDraft,
    user: Option<String>,
    task_id: Option<Uuid>,
) -> Result<Endpoint> {
    let staged = staging::stage(&package.package_dir)?;
    tracing::info!(package = %package.identity, dir = %staged.path().display(), "building payload");

    contract::write_build_config(staged.path(), build_args)?;

    invoke::run_target(runner, config, staged.path(), BuildTarget::PayloadEntry).await?;

    // Log first: even if the rest of the harvest fails, the build output
    // is preserved for diagnosis.
    let log_text = contract::read_log(staged.path(), contract::PAYLOAD_LOG_FILE)?;
    logs.append(
        ExecutionLog::new(LogCategory::PayloadBuild, log_text)
            .with_user(user)
            .with_task(task_id),
    )
    .await?;

    let endpoint_config = contract::read_final_config(staged.path())?;
    let endpoint_id = endpoint_config.agent_config.endpoint_id;

    let payload_dest = config
        .payloads_dir()
        .join(format!("{}-{endpoint_id}.tar.gz", package.identity));
    let payload_file = contract::collect_payload(staged.path(), &payload_dest)?;

    let endpoint = Endpoint::from_build(
        endpoint_config,
        package.identity.clone(),
        payload_file,
        draft,
    );
    endpoints.insert(endpoint.clone()).await?;
    tracing::info!(endpoint = %endpoint.id, package = %package.identity, "built payload and registered endpoint");

    staged.release()?;
    Ok(endpoint)
}
