//! Alias analysis application layer

pub mod analyzer;
pub mod diagnostics;
pub mod driver;

pub use analyzer::{AliasAnalysis, AnalysisStats};
pub use driver::{AliasDriver, FixpointStats};
