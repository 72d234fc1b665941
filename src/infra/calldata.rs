//! Calldata generation for the on-chain verifier.
//!
//! The relay never builds calldata itself; it asks a [`CalldataGenerator`].
//! The production implementation shells out to the `garaga` CLI.

use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::domain::{parse_field_element, ArtifactPaths, CalldataArray};

use super::error::{RelayError, Result};

/// Proof system identifier passed to the calldata tool.
pub const PROOF_SYSTEM: &str = "ultra_starknet_zk_honk";

/// How strictly to interpret the calldata tool's stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CalldataParseMode {
    /// Only a JSON array is accepted (`--format array` is always requested).
    Strict,
    /// JSON array first, then whitespace-separated tokens.
    #[default]
    Tolerant,
}

impl FromStr for CalldataParseMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(CalldataParseMode::Strict),
            "tolerant" => Ok(CalldataParseMode::Tolerant),
            other => Err(format!(
                "unknown calldata parse mode {other:?} (expected strict or tolerant)"
            )),
        }
    }
}

/// Produces verifier calldata from proof artifacts on disk.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CalldataGenerator: Send + Sync {
    /// Paths are expected to exist and be absolute.
    async fn generate_calldata(&self, paths: &ArtifactPaths) -> Result<CalldataArray>;
}

/// Runs `garaga calldata ... --format array` as a subprocess.
#[derive(Debug, Clone)]
pub struct GaragaCalldataGenerator {
    program: PathBuf,
    mode: CalldataParseMode,
}

impl GaragaCalldataGenerator {
    pub fn new(program: impl Into<PathBuf>, mode: CalldataParseMode) -> Self {
        Self {
            program: program.into(),
            mode,
        }
    }

    pub fn mode(&self) -> CalldataParseMode {
        self.mode
    }

    fn command(&self, paths: &ArtifactPaths) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("calldata")
            .args(["--system", PROOF_SYSTEM])
            .arg("--proof")
            .arg(&paths.proof_path)
            .arg("--vk")
            .arg(&paths.vk_path)
            .arg("--public-inputs")
            .arg(&paths.public_inputs_path)
            .args(["--format", "array"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for GaragaCalldataGenerator {
    fn default() -> Self {
        Self::new("garaga", CalldataParseMode::default())
    }
}

#[async_trait]
impl CalldataGenerator for GaragaCalldataGenerator {
    #[instrument(skip_all, fields(program = %self.program.display()))]
    async fn generate_calldata(&self, paths: &ArtifactPaths) -> Result<CalldataArray> {
        debug!(
            proof = %paths.proof_path.display(),
            vk = %paths.vk_path.display(),
            public_inputs = %paths.public_inputs_path.display(),
            "running calldata tool"
        );

        let output = self.command(paths).output().await.map_err(|e| {
            RelayError::CalldataTool(format!("could not run {}: {e}", self.program.display()))
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(RelayError::CalldataTool(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            warn!(stderr = %stderr.trim(), "calldata tool reported warnings");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let calldata = parse_calldata_output(&stdout, self.mode)?;
        debug!(elements = calldata.len(), "calldata generated");
        Ok(calldata)
    }
}

/// Parse the calldata tool's stdout into hex field elements.
pub fn parse_calldata_output(stdout: &str, mode: CalldataParseMode) -> Result<CalldataArray> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(RelayError::CalldataParse("empty output".to_string()));
    }

    let elements = match (serde_json::from_str::<Value>(trimmed), mode) {
        (Ok(Value::Array(items)), _) => items
            .iter()
            .map(json_element_to_hex)
            .collect::<Result<Vec<_>>>()?,
        (_, CalldataParseMode::Tolerant) => trimmed
            .split_whitespace()
            .map(token_to_hex)
            .collect::<Result<Vec<_>>>()?,
        (Ok(other), CalldataParseMode::Strict) => {
            return Err(RelayError::CalldataParse(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )));
        }
        (Err(e), CalldataParseMode::Strict) => {
            return Err(RelayError::CalldataParse(format!(
                "output is not a JSON array: {e}"
            )));
        }
    };

    Ok(CalldataArray::new(elements))
}

fn json_element_to_hex(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => token_to_hex(s),
        Value::Number(n) => token_to_hex(&n.to_string()),
        other => Err(RelayError::CalldataParse(format!(
            "unexpected {} in calldata array",
            json_kind(other)
        ))),
    }
}

fn token_to_hex(token: &str) -> Result<String> {
    parse_field_element(token)
        .map(|value| format!("0x{}", value.to_str_radix(16)))
        .map_err(RelayError::CalldataParse)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
