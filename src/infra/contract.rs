//! The filesystem exchange contract shared by every staged invocation.
//!
//! Inputs are written into the staged directory before the build target
//! runs; outputs are harvested from it afterwards. Writers only serialize.
//! Readers validate presence before parsing and raise a distinct error per
//! missing artifact: the absence of a required output file, not the
//! build's exit code, is the authoritative failure signal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::{ContractError, EndpointConfig, ExchangeConfig, Message};

/// Input document for a message exchange.
pub const EXCHANGE_CONFIG_FILE: &str = "exchange_config.json";
/// The outgoing message, written only when sending.
pub const MESSAGE_INPUT_FILE: &str = "message.json";
/// Caller-supplied build arguments, written only for payload builds.
pub const BUILD_CONFIG_FILE: &str = "build_config.json";
/// Free-text log a payload build must leave behind.
pub const PAYLOAD_LOG_FILE: &str = "payload-logs.txt";
/// Free-text log a message exchange must leave behind.
pub const MESSAGE_LOG_FILE: &str = "message-logs.txt";
/// Optional opaque state blob; absence means "no change".
pub const PROTOCOL_STATE_FILE: &str = "protocol_state.json";
/// Message batch a receive must leave behind; `[]` means nothing arrived.
pub const MESSAGE_BATCH_FILE: &str = "messages.json";
/// Final configuration a payload build must leave behind.
pub const FINAL_CONFIG_FILE: &str = "agent_cfg.json";
/// The built deliverable.
pub const PAYLOAD_ARTIFACT_FILE: &str = "payload.tar.gz";

// ── Writers ───────────────────────────────────────────────────────────────────

fn write_json(dir: &Path, file: &str, value: &impl serde::Serialize) -> Result<()> {
    let path = dir.join(file);
    let content = serde_json::to_string(value).with_context(|| format!("serializing {file}"))?;
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
}

/// Write the exchange input document.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_exchange_config(dir: &Path, config: &ExchangeConfig) -> Result<()> {
    write_json(dir, EXCHANGE_CONFIG_FILE, config)
}

/// Write the outgoing message for a send.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_outgoing_message(dir: &Path, message: &Message) -> Result<()> {
    write_json(dir, MESSAGE_INPUT_FILE, message)
}

/// Write the caller-supplied build arguments for a payload build.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_build_config(dir: &Path, build_args: &serde_json::Value) -> Result<()> {
    write_json(dir, BUILD_CONFIG_FILE, build_args)
}

// ── Readers ───────────────────────────────────────────────────────────────────

/// Read the free-text execution log named by `file`.
///
/// # Errors
///
/// Returns [`ContractError::MissingLog`] if the file is absent, a fatal
/// contract violation.
pub fn read_log(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    if !path.exists() {
        return Err(ContractError::MissingLog(path).into());
    }
    std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

/// Read the optional protocol-state blob. Absence means "no change".
///
/// # Errors
///
/// Returns an error only if a present file cannot be read or parsed.
pub fn read_protocol_state(dir: &Path) -> Result<Option<serde_json::Value>> {
    let path = dir.join(PROTOCOL_STATE_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let state = serde_json::from_str(&content).map_err(|e| ContractError::Malformed {
        file: PROTOCOL_STATE_FILE.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(state))
}

/// Read the harvested message batch after a receive.
///
/// # Errors
///
/// Returns [`ContractError::MissingMessageBatch`] if the file is absent
/// (an empty array is the correct way to signal "nothing received"), or
/// [`ContractError::Malformed`] if it is not a JSON array of messages.
pub fn read_message_batch(dir: &Path) -> Result<Vec<Message>> {
    let path = dir.join(MESSAGE_BATCH_FILE);
    if !path.exists() {
        return Err(ContractError::MissingMessageBatch(path).into());
    }
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let messages = serde_json::from_str(&content).map_err(|e| ContractError::Malformed {
        file: MESSAGE_BATCH_FILE.to_string(),
        reason: e.to_string(),
    })?;
    Ok(messages)
}

/// Read the final endpoint configuration after a payload build.
///
/// # Errors
///
/// Returns [`ContractError::MissingFinalConfig`] if the file is absent, or
/// [`ContractError::Malformed`] if it does not carry the expected typed
/// fields (notably the build-minted endpoint id).
pub fn read_final_config(dir: &Path) -> Result<EndpointConfig> {
    let path = dir.join(FINAL_CONFIG_FILE);
    if !path.exists() {
        return Err(ContractError::MissingFinalConfig(path).into());
    }
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let config = serde_json::from_str(&content).map_err(|e| ContractError::Malformed {
        file: FINAL_CONFIG_FILE.to_string(),
        reason: e.to_string(),
    })?;
    Ok(config)
}

/// Relocate the built payload artifact from the staged directory to
/// `dest`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ContractError::MissingPayload`] if the artifact is absent, or
/// an I/O error if the copy fails.
pub fn collect_payload(dir: &Path, dest: &Path) -> Result<PathBuf> {
    let source = dir.join(PAYLOAD_ARTIFACT_FILE);
    if !source.exists() {
        return Err(ContractError::MissingPayload(source).into());
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::copy(&source, dest).with_context(|| format!("copying payload to {}", dest.display()))?;
    Ok(dest.to_path_buf())
}
