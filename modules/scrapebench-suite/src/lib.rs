//! Benchmark suite execution: task dispatch, quality analysis, and the
//! resumable fetch/analyze pipeline.

pub mod analyzer;
pub mod dispatcher;
pub mod suite;

pub use suite::QualitySuite;
