//! Core data model for one analyzed binary.
//!
//! The shapes mirror the JSON payload written by the post-analysis script, so
//! decoding is a direct `serde_json::from_value` into [`AnalysisResult`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::address::Address;

/// Snapshot produced by one successful analyzer invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub program_name: String,
    pub entry_point: Address,
    /// Processor language id as reported by Ghidra (e.g. `x86:LE:64:default`).
    #[serde(rename = "language")]
    pub architecture: String,
    pub image_base: Address,
    #[serde(default)]
    pub entry_function: Option<Function>,
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub disassembly: Vec<Instruction>,
}

/// A function discovered by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub entry_point: Address,
    #[serde(default)]
    pub signature: String,
    /// Decompiled C text; only present for the entry function.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Address-set text of the function body, e.g. `[[00401000, 0040104f] ]`.
    #[serde(default, alias = "body_range", skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub address: Address,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Where the analyzer got the name from (`IMPORTED`, `ANALYSIS`, `USER_DEFINED`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub address: Address,
    #[serde(default)]
    pub bytes: String,
    pub mnemonic: String,
    #[serde(default)]
    pub operands: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl AnalysisResult {
    /// True when `function` is the entry function (same name and address).
    pub fn is_entry_function(&self, function: &Function) -> bool {
        self.entry_function
            .as_ref()
            .map(|entry| entry.entry_point == function.entry_point && entry.name == function.name)
            .unwrap_or(false)
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
