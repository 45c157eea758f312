//! Text renderings of an analysis result.
//!
//! Each renderer turns an [`AnalysisResult`] into display lines plus a
//! line↔address index. Rendering is pure: the same input always yields the
//! same lines and index, and a refresh always re-renders from scratch.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::model::AnalysisResult;

pub mod decompiled;
pub mod disassembly;

/// Which rendering a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Decompiled,
    Disassembly,
}

impl ViewKind {
    pub fn toggled(self) -> Self {
        match self {
            ViewKind::Decompiled => ViewKind::Disassembly,
            ViewKind::Disassembly => ViewKind::Decompiled,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::Decompiled => "decompiled",
            ViewKind::Disassembly => "disassembly",
        }
    }
}

/// Rendered lines and their address anchors. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedView {
    pub lines: Vec<String>,
    pub line_to_address: BTreeMap<usize, Address>,
    address_to_line: HashMap<Address, usize>,
}

impl RenderedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unanchored line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append a line anchored to `address`. When several lines share an
    /// address, the first one is the jump target.
    pub fn push_anchored(&mut self, line: impl Into<String>, address: Address) {
        self.lines.push(line.into());
        let line_no = self.lines.len();
        self.line_to_address.insert(line_no, address);
        self.address_to_line.entry(address).or_insert(line_no);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text of a 1-based line.
    pub fn line(&self, line_no: usize) -> Option<&str> {
        line_no.checked_sub(1).and_then(|i| self.lines.get(i)).map(String::as_str)
    }

    pub fn address_of(&self, line_no: usize) -> Option<Address> {
        self.line_to_address.get(&line_no).copied()
    }

    /// Exact lookup; no nearest-address fallback.
    pub fn line_of(&self, address: Address) -> Option<usize> {
        self.address_to_line.get(&address).copied()
    }

    /// Nearest anchored line at or before `line_no`, with its address.
    pub fn address_at_or_before(&self, line_no: usize) -> Option<(usize, Address)> {
        self.line_to_address.range(..=line_no).next_back().map(|(l, a)| (*l, *a))
    }

    pub fn first_anchored_line(&self) -> Option<usize> {
        self.line_to_address.keys().next().copied()
    }
}

/// Render `result` with the renderer for `kind`.
pub fn render(kind: ViewKind, result: &AnalysisResult) -> RenderedView {
    match kind {
        ViewKind::Decompiled => decompiled::render(result),
        ViewKind::Disassembly => disassembly::render(result),
    }
}
