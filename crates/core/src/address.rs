//! Hexadecimal address codec.
//!
//! Addresses are stored as plain `u64` values. The textual form is always
//! `0x` followed by lowercase hex with no padding, while parsing accepts the
//! prefix optionally so that user input (`401000`, `0x401000`) and analyzer
//! output (`00401000`) all land on the same value.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{NeoError, NeoResult};

/// A binary address in canonical numeric form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub u64);

impl Address {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Parse a hex address, with or without a `0x` prefix.
pub fn parse(text: &str) -> NeoResult<Address> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(NeoError::InvalidAddress(text.to_string()));
    }

    u64::from_str_radix(digits, 16)
        .map(Address)
        .map_err(|_| NeoError::InvalidAddress(text.to_string()))
}

/// Render an address as `0x` + lowercase hex.
pub fn format(address: Address) -> String {
    format!("{:#x}", address.0)
}

/// Parse an address as emitted by the analyzer, which may qualify it with an
/// address space (`ram:00401000`).
pub fn parse_qualified(text: &str) -> NeoResult<Address> {
    match text.rsplit_once(':') {
        Some((_space, offset)) => parse(offset),
        None => parse(text),
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl FromStr for Address {
    type Err = NeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address(value)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*self))
    }
}

struct AddressVisitor;

impl<'de> Visitor<'de> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a hex address string or an unsigned integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Address, E> {
        Ok(Address(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Address, E> {
        u64::try_from(v).map(Address).map_err(|_| E::custom(format!("negative address {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Address, E> {
        parse_qualified(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AddressVisitor)
    }
}
