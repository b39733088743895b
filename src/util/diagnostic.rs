//! Structured diagnostics.
//!
//! Every stage reports through a caller-owned [`Diagnostics`] sink.
//! Errors never abort the pipeline; fatals do, and are always pushed to
//! the sink before the stage returns its `Err`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Location;

/// Common suggestion messages for consistent reporting.
pub mod suggestions {
    pub const UNSUPPORTED: &str =
        "the declaration is skipped; expose it through a plain function or record instead";

    pub const DUPLICATE_DEFINITION: &str =
        "remove one of the definitions or give the overloads different parameter types";

    pub const NAME_CONFLICT: &str = "rename one of the entities or move it to another namespace";

    pub const AMBIGUOUS_COMMENT: &str =
        "put the comment on its own line directly above the declaration it documents";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// Closed set of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    ParseError,
    AttributionAmbiguity,
    DuplicateDefinition,
    UnsupportedConstruct,
    NameConflict,
    InternalInvariantViolation,
    Cancelled,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ParseError => "parse-error",
            DiagnosticCode::AttributionAmbiguity => "attribution-ambiguity",
            DiagnosticCode::DuplicateDefinition => "duplicate-definition",
            DiagnosticCode::UnsupportedConstruct => "unsupported-construct",
            DiagnosticCode::NameConflict => "name-conflict",
            DiagnosticCode::InternalInvariantViolation => "internal-invariant-violation",
            DiagnosticCode::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic record with optional context and suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Machine-readable code
    pub code: DiagnosticCode,
    /// Primary message
    pub message: String,
    /// Where the problem was found
    #[serde(default)]
    pub location: Option<Location>,
    /// Additional context lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// Suggested fixes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            code,
            message: message.into(),
            location: None,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Info, code, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, code, message)
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, code, message)
    }

    pub fn fatal(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Fatal, code, message)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Attach a source location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Fatal | Severity::Error => format!("\x1b[1;31m{}\x1b[0m", self.severity),
                Severity::Warning => format!("\x1b[1;33m{}\x1b[0m", self.severity),
                Severity::Info => format!("\x1b[1;36m{}\x1b[0m", self.severity),
            }
        } else {
            self.severity.to_string()
        };

        output.push_str(&format!("{}[{}]: {}\n", severity_str, self.code, self.message));

        if let Some(ref location) = self.location {
            output.push_str(&format!("  --> {}\n", location));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Ordered sink of diagnostics produced during one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Fatal | Severity::Error => {
                tracing::debug!("{}: {}", diagnostic.code, diagnostic.message)
            }
            Severity::Warning | Severity::Info => {
                tracing::trace!("{}: {}", diagnostic.code, diagnostic.message)
            }
        }
        self.records.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records at exactly `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.records.iter().filter(|d| d.severity == severity).count()
    }

    /// Whether any record is at least as severe as `severity`.
    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.records.iter().any(|d| d.severity >= severity)
    }

    /// Records carrying `code`, in push order.
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<&Diagnostic> {
        self.records.iter().filter(|d| d.code == code).collect()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
