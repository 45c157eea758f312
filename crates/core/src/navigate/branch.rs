//! Control-transfer target extraction from a single rendered line.
//!
//! Grammar (case-insensitive, whitespace separated tokens; anything after a
//! `;` is a comment and ignored):
//!
//! ```text
//! line     := [address] [bytes...] mnemonic operands
//! mnemonic := call* | j<1-4 letters> | b | bl | blr | blx | br | bx
//!           | b.<cond> | b<cond>
//! cond     := eq ne cs cc mi pl vs vc hi ls ge lt gt le al hs lo
//! target   := first `0x`-prefixed hex literal
//!           | first bare hex run of 4+ digits containing a decimal digit
//!           | first identifier that is not an operand size keyword
//! ```
//!
//! This is not a disassembler; lines that don't fit simply yield `None`.

use std::sync::OnceLock;

use regex::Regex;

use crate::address::{self, Address};

/// What a branch or call points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchTarget {
    Address(Address),
    Name(String),
}

const SIZE_KEYWORDS: &[&str] = &["byte", "word", "dword", "qword", "xmmword", "ptr", "far", "near", "short"];

fn mnemonic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:call[a-z]*|j[a-z]{1,4}|b|bl|blr|blx|br|bx|b\.[a-z]{2}|b(?:eq|ne|cs|cc|mi|pl|vs|vc|hi|ls|ge|lt|gt|le|al|hs|lo))$",
        )
        .expect("valid mnemonic regex")
    })
}

fn hex_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b0[xX][0-9a-fA-F]+\b").expect("valid hex regex"))
}

fn bare_hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[0-9a-fA-F]{4,16}\b").expect("valid bare hex regex"))
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z_.$@?][\w.$@?]*").expect("valid identifier regex"))
}

/// True when `token` is a recognized call/jump/branch mnemonic.
pub fn is_control_transfer(token: &str) -> bool {
    mnemonic_re().is_match(token)
}

/// Extract the target of a call/jump/branch on `line`, if it is one.
pub fn parse_branch_target(line: &str) -> Option<BranchTarget> {
    let code = line.split(';').next().unwrap_or_default();
    let mut tokens = code.split_whitespace();
    tokens.by_ref().find(|t| is_control_transfer(t))?;
    let operands: Vec<&str> = tokens.collect();
    if operands.is_empty() {
        return None;
    }
    parse_operand(&operands.join(" "))
}

fn parse_operand(operands: &str) -> Option<BranchTarget> {
    if let Some(m) = hex_literal_re().find(operands) {
        return address::parse(m.as_str()).ok().map(BranchTarget::Address);
    }

    let bare = bare_hex_re()
        .find_iter(operands)
        .find(|m| m.as_str().chars().any(|c| c.is_ascii_digit()));
    if let Some(m) = bare {
        return address::parse(m.as_str()).ok().map(BranchTarget::Address);
    }

    identifier_re()
        .find_iter(operands)
        .map(|m| m.as_str())
        .find(|name| !SIZE_KEYWORDS.contains(&name.to_ascii_lowercase().as_str()))
        .map(|name| BranchTarget::Name(name.to_string()))
}
