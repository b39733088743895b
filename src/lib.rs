//! stubforge - Python stubs from C/C++ headers
//!
//! This crate turns header declarations into a language-neutral Binding
//! Intermediate Representation (BIR) and renders it through emitters.
//! The pipeline runs comment attribution, visibility filtering,
//! normalization, overload grouping, aggregate synthesis and assembly,
//! in that order.

pub mod bindings;
pub mod bir;
pub mod core;
pub mod emit;
pub mod ops;
pub mod source;
pub mod util;

/// Test utilities for stubforge unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides header fixtures and a builder for hand-made record streams.
#[cfg(test)]
pub mod test_support;

pub use bir::{Bir, BirDocument, Emitter};
pub use ops::pipeline::{CancelToken, Pipeline, PipelineError};
pub use source::{DeclarationSource, HeaderSource, MemorySource};
pub use util::diagnostic::{Diagnostic, Diagnostics};
