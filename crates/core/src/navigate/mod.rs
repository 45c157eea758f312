//! Cursor navigation over rendered views and go-to-definition resolution.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::address::Address;
use crate::error::{NeoError, NeoResult};
use crate::model::AnalysisResult;
use crate::render::{render, RenderedView, ViewKind};
use crate::symbols;

pub mod branch;

pub use branch::{parse_branch_target, BranchTarget};

/// One open view of a binary: which rendering, its content and index, and the cursor.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub kind: ViewKind,
    pub binary: PathBuf,
    pub view: RenderedView,
    /// 1-based cursor line.
    pub cursor: usize,
}

impl ViewState {
    /// Render `result` and place the cursor on the first anchored line.
    pub fn open(kind: ViewKind, binary: &Path, result: &AnalysisResult) -> Self {
        let view = render(kind, result);
        let cursor = view.first_anchored_line().unwrap_or(1);
        Self { kind, binary: binary.to_path_buf(), view, cursor }
    }

    /// Rebuild lines and index from scratch, keeping the cursor in range.
    pub fn refresh(&mut self, result: &AnalysisResult) {
        self.view = render(self.kind, result);
        self.cursor = self.cursor.clamp(1, self.view.len().max(1));
    }

    pub fn find_line(&self, address: Address) -> Option<usize> {
        find_line(&self.view, address)
    }

    /// Move the cursor to the line for `address`.
    pub fn jump_to(&mut self, address: Address) -> NeoResult<usize> {
        let line = self.find_line(address).ok_or(NeoError::AddressNotFound(address))?;
        self.cursor = line;
        Ok(line)
    }

    /// Move the cursor to a line, clamped to the view.
    pub fn set_cursor(&mut self, line: usize) {
        self.cursor = line.clamp(1, self.view.len().max(1));
    }

    /// The address the cursor stands for.
    ///
    /// Disassembly lines carry their own address, so only an exact anchor
    /// counts. In the decompiled view most lines have none, so the nearest
    /// anchored line at or above the cursor is used.
    pub fn current_address(&self) -> Option<Address> {
        match self.kind {
            ViewKind::Disassembly => self.view.address_of(self.cursor),
            ViewKind::Decompiled => self.view.address_at_or_before(self.cursor).map(|(_, a)| a),
        }
    }

    pub fn current_line(&self) -> Option<&str> {
        self.view.line(self.cursor)
    }
}

/// Exact line lookup for `address`.
pub fn find_line(view: &RenderedView, address: Address) -> Option<usize> {
    view.line_of(address)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Function,
    Symbol,
    /// A literal branch target with no known name.
    Address,
}

/// Where go-to-definition landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub name: String,
    pub address: Address,
    pub kind: DefinitionKind,
}

/// Resolve the definition for `word` on `current_line`.
///
/// Tries, in order: a function named `word`, a symbol named `word`, then the
/// target of the control-transfer instruction on `current_line`.
pub fn resolve_definition(
    current_line: &str,
    word: &str,
    result: &AnalysisResult,
) -> NeoResult<Definition> {
    let word = word.trim();
    if !word.is_empty() {
        if let Some(def) = by_name(result, word) {
            return Ok(def);
        }
    }

    match parse_branch_target(current_line) {
        Some(BranchTarget::Name(name)) => {
            by_name(result, &name).ok_or(NeoError::DefinitionNotFound(name))
        }
        Some(BranchTarget::Address(address)) => Ok(by_address(result, address)),
        None => {
            let what = if word.is_empty() { current_line.trim() } else { word };
            Err(NeoError::DefinitionNotFound(what.to_string()))
        }
    }
}

fn by_name(result: &AnalysisResult, name: &str) -> Option<Definition> {
    if let Some(f) = symbols::find_function(result, name) {
        return Some(Definition {
            name: f.name.clone(),
            address: f.entry_point,
            kind: DefinitionKind::Function,
        });
    }
    symbols::find_symbol(result, name).map(|s| Definition {
        name: s.name.clone(),
        address: s.address,
        kind: DefinitionKind::Symbol,
    })
}

fn by_address(result: &AnalysisResult, address: Address) -> Definition {
    if let Some(f) = symbols::function_at(result, address) {
        return Definition { name: f.name.clone(), address, kind: DefinitionKind::Function };
    }
    if let Ok(s) = symbols::symbol_at(result, address) {
        return Definition { name: s.name.clone(), address, kind: DefinitionKind::Symbol };
    }
    Definition { name: address.to_string(), address, kind: DefinitionKind::Address }
}
