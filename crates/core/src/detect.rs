//! Binary detection by magic bytes or file-name pattern.
//!
//! Detection only decides whether a file is worth handing to the analyzer;
//! it does not parse any headers.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use regex::Regex;
use serde::Serialize;

use crate::error::{NeoError, NeoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryFormat {
    Elf,
    Pe,
    MachO,
}

const MACHO_MAGICS: [u32; 4] = [0xfeed_face, 0xfeed_facf, 0xcefa_edfe, 0xcffa_edfe];

/// Identify a format from the first bytes of a file.
pub fn sniff_magic(header: &[u8]) -> Option<BinaryFormat> {
    if header.starts_with(&[0x7f, b'E', b'L', b'F']) {
        return Some(BinaryFormat::Elf);
    }
    if header.starts_with(b"MZ") {
        return Some(BinaryFormat::Pe);
    }
    let first4: [u8; 4] = header.get(..4)?.try_into().ok()?;
    if MACHO_MAGICS.contains(&u32::from_be_bytes(first4)) {
        return Some(BinaryFormat::MachO);
    }
    None
}

/// Why a file counts as a binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "lowercase")]
pub enum Detection {
    Magic(BinaryFormat),
    Pattern(String),
    NotBinary,
}

impl Detection {
    pub fn is_binary(&self) -> bool {
        !matches!(self, Detection::NotBinary)
    }
}

/// Matches files against magic bytes and configured name globs.
#[derive(Debug, Clone)]
pub struct BinaryDetector {
    patterns: Vec<(String, Regex)>,
}

impl BinaryDetector {
    /// Compile glob patterns (`*` and `?` wildcards). Patterns are matched
    /// against the file name, or the whole path when they contain `/`.
    pub fn new(patterns: &[String]) -> NeoResult<Self> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(&glob_to_regex(p))
                    .map(|re| (p.clone(), re))
                    .map_err(|e| NeoError::Config(format!("invalid binary pattern '{p}': {e}")))
            })
            .collect::<NeoResult<Vec<_>>>()?;
        Ok(Self { patterns: compiled })
    }

    /// The first configured pattern matching `path`, if any.
    pub fn matching_pattern(&self, path: &Path) -> Option<&str> {
        let full = path.to_string_lossy();
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        self.patterns
            .iter()
            .find(|(pattern, re)| {
                if pattern.contains('/') {
                    re.is_match(&full)
                } else {
                    re.is_match(&name)
                }
            })
            .map(|(pattern, _)| pattern.as_str())
    }

    /// Check magic bytes first, then name patterns.
    pub fn detect(&self, path: &Path) -> NeoResult<Detection> {
        let mut header = Vec::with_capacity(4);
        File::open(path)?.take(4).read_to_end(&mut header)?;
        if let Some(format) = sniff_magic(&header) {
            return Ok(Detection::Magic(format));
        }
        Ok(match self.matching_pattern(path) {
            Some(pattern) => Detection::Pattern(pattern.to_string()),
            None => Detection::NotBinary,
        })
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}
