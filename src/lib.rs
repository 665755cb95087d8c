//! Afinar - compiler pass-ordering autotuner
//!
//! This library provides the core functionality behind the `afinar` binary:
//! configuration loading, the variant measurement engine, the sweep driver,
//! statistical summarization, cross-run aggregation, majority-vote resolution
//! of dominant pass orderings, and the benchmark feature correlation table.

pub mod aggregate;
pub mod cli;
pub mod collect;
pub mod config;
pub mod csv_table;
pub mod features;
pub mod majority;
pub mod measure;
pub mod pass_order;
pub mod repeat;
pub mod stats;
pub mod summary;
pub mod sweep;
pub mod tools;
