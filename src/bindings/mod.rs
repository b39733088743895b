//! Binding stages.
//!
//! Each stage consumes the previous stage's output:
//!
//! ```text
//! unit -> attribute -> filter -> normalize -> group -> synthesize -> assemble -> BIR
//! ```
//!
//! The first three run per translation unit; grouping and assembly see the
//! items of every unit at once.

pub mod aggregate;
pub mod assemble;
pub mod attribute;
pub mod docstring;
pub mod errors;
pub mod normalize;
pub mod overload;
pub mod types;
pub mod visibility;

pub use aggregate::synthesize_aggregates;
pub use assemble::{assemble, Placed};
pub use attribute::{attribute, AttributedUnit};
pub use errors::PipelineError;
pub use normalize::{normalize, Item};
pub use overload::{group_overloads, Grouped};
pub use visibility::{drop_superseded_forward_declarations, RecordTraits, VisibilityFilter};
