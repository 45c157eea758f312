use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::address::Address;

/// Every failure the core can surface to a frontend.
///
/// All variants are recoverable. The enum is `Clone` so that one invocation
/// outcome can be handed to every caller that was coalesced onto it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NeoError {
    #[error("Ghidra analyzeHeadless not found: {0}")]
    ToolNotFound(String),

    #[error("Post-analysis script not found at {0}")]
    ScriptNotFound(PathBuf),

    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),

    /// Non-zero exit without a usable payload. `None` when the process was
    /// terminated by a signal.
    #[error("Ghidra exited with {}", describe_exit(.0))]
    ProcessFailed(Option<i32>),

    #[error("Malformed analyzer output: {0}")]
    MalformedOutput(String),

    #[error("Ghidra reported an error: {message}")]
    ToolReportedError { message: String, trace: Option<String> },

    #[error("Analysis timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Address {0} not found in the current view")]
    AddressNotFound(Address),

    #[error("No definition found for '{0}'")]
    DefinitionNotFound(String),

    #[error("No symbol at address {0}")]
    SymbolNotFound(Address),

    #[error("Invalid address: '{0}'")]
    InvalidAddress(String),

    #[error("No analysis available for {0}")]
    NotAnalyzed(PathBuf),

    #[error("No active view")]
    NoActiveView,

    #[error("No address at the cursor line")]
    NoAddressAtCursor,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience result type for core operations.
pub type NeoResult<T> = Result<T, NeoError>;

/// How loudly a failure should be reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl NeoError {
    /// Navigation misses and bad user input are warnings; everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            NeoError::AddressNotFound(_)
            | NeoError::DefinitionNotFound(_)
            | NeoError::SymbolNotFound(_)
            | NeoError::InvalidAddress(_)
            | NeoError::NoAddressAtCursor => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl From<std::io::Error> for NeoError {
    fn from(err: std::io::Error) -> Self {
        NeoError::Io(err.to_string())
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}
