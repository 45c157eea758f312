pub mod analysis;
pub mod config;
pub mod detect;
pub mod shell;
pub mod util;

pub use analysis::*;
pub use config::*;
pub use detect::*;
pub use shell::*;
pub use util::*;
