//! Analyzer orchestration: process backend, output decoding, and the service
//! that ties them to the cache.

pub mod analysis;
pub mod backends;
pub mod output;

pub use analysis::{AnalysisOutcome, AnalysisService};
