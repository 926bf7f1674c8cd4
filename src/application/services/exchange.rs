//! Message exchange with deployed endpoints.
//!
//! Both directions share one invocation path: stage the endpoint's
//! package, write the exchange input document, run the message target,
//! then harvest the log, any protocol-state update, and (when receiving)
//! the message batch.
//!
//! This module alone records messages durably, for both directions. The
//! attempted insert is the only source of truth for deduplication, and a
//! message id can never be recorded twice no matter which side produced
//! it.
//!
//! Concurrent exchanges against one endpoint are not serialized here.
//! Protocol state is last-writer-wins: two racing exchanges leave exactly
//! one exchange's state behind. Callers needing stronger guarantees
//! should run at most one exchange per endpoint at a time.

use anyhow::Result;
use uuid::Uuid;

use crate::application::ports::{
    CommandRunner, EndpointStore, InsertOutcome, LogStore, MessageStore,
};
use crate::application::services::invoke::{self, BuildTarget};
use crate::config::CoreConfig;
use crate::domain::{
    Endpoint, ExchangeAction, ExchangeConfig, ExchangeError, ExecutionLog, LogCategory, Message,
    Package,
};
use crate::infra::staging::StagedDir;
use crate::infra::{contract, staging};

/// Send `message` to an endpoint. Returns the harvested log text, which
/// doubles as the operation's result for the caller's task queue.
///
/// The outgoing message is recorded durably *before* invocation. An id
/// that already exists fails loudly: re-sending an identical identifier
/// indicates a caller bug.
///
/// # Errors
///
/// Returns [`ExchangeError::DuplicateMessage`] for a reused id,
/// or staging/build/contract errors from the invocation.
#[allow(clippy::too_many_arguments)]
pub async fn send_message(
    config: &CoreConfig,
    runner: &impl CommandRunner,
    endpoints: &impl EndpointStore,
    messages: &impl MessageStore,
    logs: &impl LogStore,
    endpoint: &mut Endpoint,
    package: &Package,
    message: &Message,
    user: Option<String>,
    task_id: Option<Uuid>,
) -> Result<String> {
    if messages.try_insert(message).await? == InsertOutcome::Duplicate {
        return Err(ExchangeError::DuplicateMessage(message.message_id).into());
    }

    let staged = invoke_exchange(
        config,
        runner,
        endpoint,
        package,
        ExchangeAction::Send,
        Some(message),
        None,
    )
    .await?;

    let log_text = harvest(endpoints, logs, endpoint, &staged, user, task_id).await?;

    staged.release()?;
    Ok(log_text)
}

/// Receive messages from an endpoint, recording each new one durably and
/// returning them.
///
/// Duplicates (ids already recorded by either direction) are dropped with
/// a warning and never fail the call. When `request_id` is supplied, the
/// *returned* list is narrowed to command responses correlating to that
/// id; everything else observed in the batch is still recorded for
/// history.
///
/// # Errors
///
/// Returns a contract error if the log or message batch is absent
/// (an empty batch must be an empty array, not a missing file), or
/// staging/build errors from the invocation.
#[allow(clippy::too_many_arguments)]
pub async fn receive_messages(
    config: &CoreConfig,
    runner: &impl CommandRunner,
    endpoints: &impl EndpointStore,
    messages: &impl MessageStore,
    logs: &impl LogStore,
    endpoint: &mut Endpoint,
    package: &Package,
    request_id: Option<Uuid>,
    user: Option<String>,
    task_id: Option<Uuid>,
) -> Result<Vec<Message>> {
    let staged = invoke_exchange(
        config,
        runner,
        endpoint,
        package,
        ExchangeAction::Receive,
        None,
        request_id,
    )
    .await?;

    harvest(endpoints, logs, endpoint, &staged, user, task_id).await?;

    let batch = contract::read_message_batch(staged.path())?;
    let mut kept = Vec::with_capacity(batch.len());
    for message in batch {
        match messages.try_insert(&message).await? {
            InsertOutcome::Inserted => kept.push(message),
            InsertOutcome::Duplicate => {
                tracing::warn!(
                    message_id = %message.message_id,
                    endpoint = %endpoint.id,
                    "dropping duplicate message",
                );
            }
        }
    }

    staged.release()?;

    if let Some(request) = request_id {
        kept.retain(|m| m.is_response_to(request));
    }
    Ok(kept)
}

/// The shared staging/write/invoke front half of an exchange. Returns the
/// staged directory so each direction can harvest its own outputs before
/// release.
async fn invoke_exchange(
    config: &CoreConfig,
    runner: &impl CommandRunner,
    endpoint: &Endpoint,
    package: &Package,
    action: ExchangeAction,
    outgoing: Option<&Message>,
    listen_for_id: Option<Uuid>,
) -> Result<StagedDir> {
    let staged = staging::stage(&package.package_dir)?;
    tracing::info!(endpoint = %endpoint.id, action = ?action, dir = %staged.path().display(), "invoking message handler");

    let document = ExchangeConfig::for_endpoint(
        endpoint,
        action,
        listen_for_id,
        config.server_private_key.clone(),
    );
    contract::write_exchange_config(staged.path(), &document)?;
    if let Some(message) = outgoing {
        contract::write_outgoing_message(staged.path(), message)?;
    }

    invoke::run_target(runner, config, staged.path(), BuildTarget::MessageEntry).await?;
    Ok(staged)
}

/// The shared harvest tail: record the exchange log (fatal if absent) and
/// apply any protocol-state update to the endpoint, both in memory and in
/// the store. Returns the log text.
async fn harvest(
    endpoints: &impl EndpointStore,
    logs: &impl LogStore,
    endpoint: &mut Endpoint,
    staged: &StagedDir,
    user: Option<String>,
    task_id: Option<Uuid>,
) -> Result<String> {
    let log_text = contract::read_log(staged.path(), contract::MESSAGE_LOG_FILE)?;
    logs.append(
        ExecutionLog::new(LogCategory::MessageExchange, log_text.clone())
            .with_user(user)
            .with_task(task_id)
            .with_endpoint(endpoint.id),
    )
    .await?;

    if let Some(state) = contract::read_protocol_state(staged.path())? {
        endpoint.protocol_state = Some(state.clone());
        endpoints.save_protocol_state(endpoint.id, state).await?;
    }
    Ok(log_text)
}
