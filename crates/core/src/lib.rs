//! neoghidra-core
//!
//! Drives Ghidra's headless analyzer, caches what it reports per binary, and
//! renders the result as navigable decompiled and disassembly text.
//!
//! All substantive logic lives here so it is testable and reusable from
//! multiple frontends; the CLI crate is a thin shell around [`session::Session`].

pub mod address;
pub mod cache;
pub mod detect;
pub mod error;
pub mod model;
pub mod navigate;
pub mod project;
pub mod render;
pub mod services;
pub mod session;
pub mod symbols;

pub use address::Address;
pub use cache::{AnalysisCache, SharedCache};
pub use error::{NeoError, NeoResult, Severity};
pub use model::AnalysisResult;
pub use render::ViewKind;
pub use session::{Notification, Session};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
