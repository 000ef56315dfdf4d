//! docload: synthetic workload generator for document databases.
//!
//! A benchmark file declares collections, how their documents reference
//! each other, and the phases to run. [`assemble`] turns it into a
//! [`docload_runner::Benchmark`] backed by the generation engine in
//! [`docload_generator`].

pub mod assemble;
pub mod config;

pub use assemble::{assemble, AssembledBenchmark};
pub use config::{BenchmarkConfig, ConfigError};
