pub mod ghidra;

pub use ghidra::{headless_args, resolve_headless_path, run_with_timeout, ProcessOutput};
