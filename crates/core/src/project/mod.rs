//! Configuration and on-disk layout for analyzer projects.

pub mod config;
pub mod layout;
pub mod util;

pub use config::*;
pub use layout::*;
pub use util::*;
