//! Core value types shared by every pipeline stage.

pub mod location;
pub mod name;

pub use location::{Location, Position, Span};
pub use name::{QualifiedName, ANONYMOUS_SCOPE};
