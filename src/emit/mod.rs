//! Back-ends rendering an assembled BIR.

pub mod stub;

pub use stub::{python_type, render_stub, StubEmitter, StubOptions};
