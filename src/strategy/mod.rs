//! Query Strategies
//!
//! Single completion queries run inline on the calling scheduler thread.
//! Batches go through the parallel strategy.

pub mod parallel;

pub use parallel::{complete_parallel, CompletionQuery};
