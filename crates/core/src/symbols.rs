//! Lookup, rename, and listing over the functions and symbols of a result.

use serde::Serialize;

use crate::address::Address;
use crate::error::{NeoError, NeoResult};
use crate::model::{AnalysisResult, Function, Symbol};
use crate::render::RenderedView;

/// First function named `name`; the entry function is checked last since
/// the analyzer may or may not repeat it in the list.
pub fn find_function<'a>(result: &'a AnalysisResult, name: &str) -> Option<&'a Function> {
    result
        .functions
        .iter()
        .find(|f| f.name == name)
        .or_else(|| result.entry_function.as_ref().filter(|f| f.name == name))
}

pub fn find_symbol<'a>(result: &'a AnalysisResult, name: &str) -> Option<&'a Symbol> {
    result.symbols.iter().find(|s| s.name == name)
}

pub fn function_at(result: &AnalysisResult, address: Address) -> Option<&Function> {
    result
        .functions
        .iter()
        .find(|f| f.entry_point == address)
        .or_else(|| result.entry_function.as_ref().filter(|f| f.entry_point == address))
}

/// First symbol at exactly `address`.
pub fn symbol_at(result: &AnalysisResult, address: Address) -> NeoResult<&Symbol> {
    result.symbols.iter().find(|s| s.address == address).ok_or(NeoError::SymbolNotFound(address))
}

/// Result of a rename. Renames only touch the cached result and are never
/// written back to the Ghidra project, so `display_only` is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub address: Address,
    pub old_name: String,
    pub new_name: String,
    pub display_only: bool,
}

/// Rename the first symbol at `address` in place.
pub fn rename(
    result: &mut AnalysisResult,
    address: Address,
    new_name: &str,
) -> NeoResult<RenameOutcome> {
    let symbol = result
        .symbols
        .iter_mut()
        .find(|s| s.address == address)
        .ok_or(NeoError::SymbolNotFound(address))?;
    let old_name = std::mem::replace(&mut symbol.name, new_name.to_string());
    Ok(RenameOutcome { address, old_name, new_name: new_name.to_string(), display_only: true })
}

/// A selectable row in a function or symbol list. Selecting it jumps to `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerEntry {
    pub display: String,
    pub name: String,
    pub address: Address,
}

fn entry(name: &str, address: Address, extra: &str) -> PickerEntry {
    let display = if extra.is_empty() {
        format!("{} @ {}", name, address)
    } else {
        format!("{} @ {} [{}]", name, address, extra)
    };
    PickerEntry { display, name: name.to_string(), address }
}

/// Functions in stored order, with their signatures.
pub fn list_functions(result: &AnalysisResult) -> Vec<PickerEntry> {
    result.functions.iter().map(|f| entry(&f.name, f.entry_point, &f.signature)).collect()
}

/// Symbols in stored order, with their types.
pub fn list_symbols(result: &AnalysisResult) -> Vec<PickerEntry> {
    result.symbols.iter().map(|s| entry(&s.name, s.address, &s.kind)).collect()
}

/// A line in a view that mentions a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub line: usize,
    pub address: Option<Address>,
    pub text: String,
}

/// Every line of `view` containing `word` as a whole identifier.
pub fn references(view: &RenderedView, word: &str) -> Vec<Reference> {
    let word = word.trim();
    if word.is_empty() {
        return Vec::new();
    }
    view.lines
        .iter()
        .enumerate()
        .filter(|(_, text)| contains_identifier(text, word))
        .map(|(i, text)| Reference { line: i + 1, address: view.address_of(i + 1), text: text.clone() })
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn contains_identifier(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.map(is_ident_char).unwrap_or(false) && !after.map(is_ident_char).unwrap_or(false)
    })
}
