//! Scripted `CommandRunner` doubles.
//!
//! The real services stage directories and harvest files; the scripted
//! runner stands in for the opaque package scripts by writing the output
//! files a given make target would have produced, and by capturing the
//! input documents the services wrote before invoking it.

#![allow(clippy::expect_used, dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;

use courier_core::application::ports::CommandRunner;

use crate::helpers::exit_status;

/// Input files the services write into staged directories; captured at
/// invocation time since the staging directory is gone afterwards.
const CAPTURED_INPUTS: [&str; 3] = ["build_config.json", "exchange_config.json", "message.json"];

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub dir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    /// Contract input files present in the directory when invoked.
    pub inputs: HashMap<String, String>,
}

/// A `CommandRunner` that plays back scripted outputs per make target.
pub struct ScriptedRunner {
    outputs: HashMap<String, Vec<(String, String)>>,
    exit_code: i32,
    pub invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
            exit_code: 0,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// When `target` is invoked, write the given (file, contents) pairs
    /// into the working directory.
    #[must_use]
    pub fn on(mut self, target: &str, files: &[(&str, &str)]) -> Self {
        self.outputs.insert(
            target.to_string(),
            files
                .iter()
                .map(|(n, c)| ((*n).to_string(), (*c).to_string()))
                .collect(),
        );
        self
    }

    /// Exit every invocation with `code` instead of 0.
    #[must_use]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().expect("lock").len()
    }

    /// The captured contract input `file` from the only invocation of
    /// `target`.
    pub fn captured_input(&self, target: &str, file: &str) -> Option<String> {
        self.invocations
            .lock()
            .expect("lock")
            .iter()
            .find(|i| i.args.first().map(String::as_str) == Some(target))
            .and_then(|i| i.inputs.get(file).cloned())
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run_in(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        let mut inputs = HashMap::new();
        for file in CAPTURED_INPUTS {
            if let Ok(content) = std::fs::read_to_string(dir.join(file)) {
                inputs.insert(file.to_string(), content);
            }
        }
        self.invocations.lock().expect("lock").push(Invocation {
            dir: dir.to_path_buf(),
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            inputs,
        });

        if let Some(target) = args.first() {
            if let Some(files) = self.outputs.get(*target) {
                for (name, contents) in files {
                    std::fs::write(dir.join(name), contents)?;
                }
            }
        }

        Ok(Output {
            status: exit_status(self.exit_code),
            stdout: b"scripted build output".to_vec(),
            stderr: Vec::new(),
        })
    }
}

/// A runner that must never be reached; use where earlier validation is
/// expected to fail first.
pub struct UnreachableRunner;

impl CommandRunner for UnreachableRunner {
    async fn run_in(&self, _: &Path, _: &str, _: &[&str], _: Duration) -> Result<Output> {
        anyhow::bail!("not expected in this test")
    }
}
