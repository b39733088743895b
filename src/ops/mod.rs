//! High-level operations.
//!
//! This module contains the implementation of stubforge commands.

pub mod generate;
pub mod pipeline;

pub use generate::{bind, generate, Binding, GenerateOptions, GenerateResult};
pub use pipeline::{CancelToken, Pipeline, PipelineError};
