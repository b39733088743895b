//! Test utilities for stubforge unit tests.
//!
//! [`StreamBuilder`] hand-assembles record streams for stages that must be
//! tested without the header scanner in the way (malformed nesting, error
//! records). [`fixtures`] holds whole headers.
//!
//! # Example
//!
//! ```rust,ignore
//! use stubforge::test_support::StreamBuilder;
//!
//! let unit = StreamBuilder::new("t.h")
//!     .push_namespace(1, "m")
//!     .comment(2, "// doc")
//!     .function(3, "f")
//!     .pop(4)
//!     .unit();
//! ```

pub mod fixtures;

use std::path::Path;

use crate::core::{Position, Span};
use crate::source::record::{RawDecl, RawFunction, ScopeKind, SourceRecord};
use crate::source::TranslationUnit;

/// Builder for a flat record stream, one record per source line.
#[derive(Debug, Clone)]
pub struct StreamBuilder {
    id: String,
    records: Vec<SourceRecord>,
}

impl StreamBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        StreamBuilder {
            id: id.into(),
            records: Vec::new(),
        }
    }

    fn span(&self, line: u32, len: usize) -> Span {
        let end = u32::try_from(len.max(1)).unwrap_or(u32::MAX);
        Span::new(self.id.clone(), Position::new(line, 1), Position::new(line, end))
    }

    /// A raw comment occupying `line`.
    pub fn comment(mut self, line: u32, text: &str) -> Self {
        let span = self.span(line, text.len());
        self.records.push(SourceRecord::comment(text, span));
        self
    }

    /// A complete declaration on one line.
    pub fn decl(self, line: u32, decl: RawDecl) -> Self {
        self.begin(line, decl).end(line)
    }

    /// `void name();` on `line`.
    pub fn function(self, line: u32, name: &str) -> Self {
        let decl = RawDecl::Function(RawFunction {
            name: name.to_string(),
            return_type: "void".to_string(),
            ..RawFunction::default()
        });
        self.decl(line, decl)
    }

    pub fn begin(mut self, line: u32, decl: RawDecl) -> Self {
        let text = decl.name().to_string();
        let span = self.span(line, text.len());
        self.records.push(SourceRecord::begin(decl, text, span));
        self
    }

    pub fn end(mut self, line: u32) -> Self {
        let span = self.span(line, 1);
        self.records.push(SourceRecord::end(span));
        self
    }

    pub fn push_namespace(mut self, line: u32, name: &str) -> Self {
        let span = self.span(line, name.len());
        self.records.push(SourceRecord::push(
            ScopeKind::Namespace(Some(name.to_string())),
            format!("namespace {} {{", name),
            span,
        ));
        self
    }

    pub fn pop(mut self, line: u32) -> Self {
        let span = self.span(line, 1);
        self.records.push(SourceRecord::pop(span));
        self
    }

    pub fn error(mut self, line: u32, message: &str) -> Self {
        let span = self.span(line, 1);
        self.records.push(SourceRecord::error(message, span));
        self
    }

    pub fn build(self) -> Vec<SourceRecord> {
        self.records
    }

    pub fn unit(self) -> TranslationUnit {
        let id = self.id.clone();
        TranslationUnit::new(id, self.build())
    }
}

/// Create a temporary directory holding the given `(relative path, text)` headers.
pub fn create_header_tree(files: &[(&str, &str)]) -> tempfile::TempDir {
    let tmp = tempfile::TempDir::new().expect("failed to create temp dir");
    for (path, text) in files {
        write_file(tmp.path(), path, text);
    }
    tmp
}

fn write_file(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create header dir");
    }
    std::fs::write(&path, text).expect("failed to write header");
}
