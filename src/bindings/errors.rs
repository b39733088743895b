//! Fatal pipeline errors.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::bir::NodeKind;
use crate::core::Location;
use crate::util::diagnostic::{suggestions, Diagnostic, DiagnosticCode};

/// Failure that stops the pipeline without producing a BIR.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PipelineError {
    #[error("`{name}` is declared with conflicting kinds: {existing} and {found}")]
    #[diagnostic(
        code(stubforge::assemble::name_conflict),
        help("rename one of the entities or move it to another namespace")
    )]
    NameConflict {
        name: String,
        existing: NodeKind,
        found: NodeKind,
        first: Option<Location>,
        location: Option<Location>,
    },

    #[error("internal invariant violated: {message}")]
    #[diagnostic(code(stubforge::assemble::invariant_violation))]
    InternalInvariantViolation {
        message: String,
        location: Option<Location>,
    },

    #[error("cancelled after {completed} translation units")]
    #[diagnostic(code(stubforge::pipeline::cancelled))]
    Cancelled { completed: usize },
}

impl PipelineError {
    pub fn invariant(message: impl Into<String>, location: Option<&Location>) -> Self {
        PipelineError::InternalInvariantViolation {
            message: message.into(),
            location: location.cloned(),
        }
    }

    /// Convert to the diagnostic pushed before the error is returned.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PipelineError::NameConflict {
                existing,
                first,
                location,
                ..
            } => {
                let mut diag = Diagnostic::fatal(DiagnosticCode::NameConflict, self.to_string())
                    .with_suggestion(suggestions::NAME_CONFLICT);
                if let Some(location) = location {
                    diag = diag.with_location(location.clone());
                }
                if let Some(first) = first {
                    diag = diag.with_context(format!("first declared at {} ({})", first, existing));
                }
                diag
            }

            PipelineError::InternalInvariantViolation { location, .. } => {
                let mut diag = Diagnostic::fatal(
                    DiagnosticCode::InternalInvariantViolation,
                    self.to_string(),
                )
                .with_context("no BIR was produced");
                if let Some(location) = location {
                    diag = diag.with_location(location.clone());
                }
                diag
            }

            PipelineError::Cancelled { .. } => {
                Diagnostic::fatal(DiagnosticCode::Cancelled, self.to_string())
                    .with_context("no BIR was produced")
            }
        }
    }
}
