//! Extraction of the JSON payload embedded in analyzer output.
//!
//! analyzeHeadless interleaves its own log lines with whatever the post-script
//! prints, so the script brackets its payload with two sentinel lines. Only
//! the text strictly between them is decoded.

use serde_json::Value;

use crate::error::{NeoError, NeoResult};
use crate::model::AnalysisResult;

pub const JSON_START: &str = "__NEOGHIDRA_JSON_START__";
pub const JSON_END: &str = "__NEOGHIDRA_JSON_END__";

/// Return the lines between the first start sentinel and the next end sentinel.
pub fn extract_payload(output: &str) -> NeoResult<String> {
    let mut lines = output.lines();
    if !lines.by_ref().any(|line| line.trim() == JSON_START) {
        return Err(NeoError::MalformedOutput(format!("missing {JSON_START} marker")));
    }

    let mut body: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim() == JSON_END {
            return Ok(body.join("\n"));
        }
        body.push(line);
    }
    Err(NeoError::MalformedOutput(format!("missing {JSON_END} marker")))
}

/// Parse a payload into a JSON value without interpreting it.
pub fn parse_payload_value(payload: &str) -> NeoResult<Value> {
    serde_json::from_str(payload)
        .map_err(|e| NeoError::MalformedOutput(format!("invalid JSON payload: {e}")))
}

/// Decode a payload, turning a script-reported failure into
/// [`NeoError::ToolReportedError`].
pub fn decode_payload(payload: &str) -> NeoResult<AnalysisResult> {
    let value = parse_payload_value(payload)?;
    if let Some(err) = reported_error(&value) {
        return Err(err);
    }
    serde_json::from_value(value)
        .map_err(|e| NeoError::MalformedOutput(format!("unexpected payload shape: {e}")))
}

fn reported_error(value: &Value) -> Option<NeoError> {
    match value.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(flag) => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| flag.as_str().map(str::to_string))
                .unwrap_or_else(|| "unknown error".to_string());
            let trace = value.get("traceback").and_then(Value::as_str).map(str::to_string);
            Some(NeoError::ToolReportedError { message, trace })
        }
    }
}

/// Standard-error lines worth showing the user.
///
/// Lines mentioning `WARN` are treated as Ghidra's routine warnings and
/// dropped; every other non-empty line is kept as an advisory.
pub fn stderr_advisories(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains("WARN"))
        .map(str::to_string)
        .collect()
}
