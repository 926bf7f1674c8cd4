//! Build-target invocation against a staged package copy.
//!
//! Packages expose their install, payload, and message logic as
//! conventionally named make targets. The server never interprets the
//! scripts. It only enforces that the build descriptor exists, pins the
//! working directory, captures both output streams, and applies the
//! configured exit-code policy.

use std::fmt;
use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::CommandRunner;
use crate::config::CoreConfig;
use crate::domain::BuildError;

/// The build descriptor every package must carry at its root.
pub const BUILD_SCRIPT: &str = "Makefile";

/// The conventionally named targets a package may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Install,
    PayloadEntry,
    MessageEntry,
}

impl BuildTarget {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BuildTarget::Install => "install",
            BuildTarget::PayloadEntry => "payload_entry",
            BuildTarget::MessageEntry => "message_entry",
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run `target` inside `work_dir`, capturing output.
///
/// A non-zero exit code is not by itself fatal under the default policy:
/// the required-output checks that follow harvesting are authoritative.
/// With `fail_on_exit_code` set, the invocation aborts here instead.
///
/// # Errors
///
/// Returns [`BuildError::MissingBuildScript`] if no build descriptor is
/// present, [`BuildError::TargetFailed`] under the strict exit-code
/// policy, or whatever the runner raises (spawn failure, timeout).
pub async fn run_target(
    runner: &impl CommandRunner,
    config: &CoreConfig,
    work_dir: &Path,
    target: BuildTarget,
) -> Result<Output> {
    let script = work_dir.join(BUILD_SCRIPT);
    if !script.exists() {
        return Err(BuildError::MissingBuildScript(script).into());
    }

    let output = runner
        .run_in(work_dir, "make", &[target.as_str()], config.build_timeout)
        .await
        .with_context(|| format!("running build target '{target}'"))?;

    if !output.status.success() {
        if config.fail_on_exit_code {
            return Err(BuildError::TargetFailed {
                target: target.to_string(),
                code: output.status.code(),
            }
            .into());
        }
        tracing::warn!(
            target = %target,
            code = ?output.status.code(),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "build target exited non-zero; continuing to output checks",
        );
    }
    Ok(output)
}

/// Render captured process output as one log text, the form installs are
/// recorded in.
#[must_use]
pub fn render_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().is_empty() {
        stdout.into_owned()
    } else {
        format!("{stdout}\n--- stderr ---\n{stderr}")
    }
}
